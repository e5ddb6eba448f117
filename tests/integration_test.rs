// Integration tests for the full engine surface
//
// These exercise parse/build -> evaluate -> assign/flatten pipelines end to
// end, including the documented engine-level properties.

use serde_json::json;
use treeglom::{
    assign, flatten, glom, glom_path, parse, unflatten, EvalError, Fallback, IterMode, KeyPath,
    Spec, Value,
};

fn planets() -> Value {
    json!({
        "pluto": {"moons": 6, "population": null},
        "venus": {"population": {"aliens": 5}},
        "earth": {"moons": 1, "population": {"humans": 7700000000i64, "aliens": 1}},
    })
    .into()
}

fn dataset() -> Value {
    json!({
        "DataSet": {
            "Name": "sales",
            "PhysicalTableMap": {
                "table-7f3a": {
                    "RelationalTable": {
                        "Name": "orders",
                        "InputColumns": [
                            {"Name": "id", "Type": "INTEGER"},
                            {"Name": "total", "Type": "DECIMAL"},
                        ],
                    }
                }
            }
        }
    })
    .into()
}

// ── Documented properties ─────────────────────────────────────────────────────

#[test]
fn flatten_unflatten_roundtrip_on_object_trees() {
    // arrays flatten to index keys that unflatten rebuilds as object fields,
    // so the identity holds on array-free trees
    let v: Value = json!({
        "project": {"start_url": "https://example.test/start"},
        "defaults": {"region": "us-east-1"},
        "profile": {"name": "dev", "account_id": "123", "role": "admin"},
        "active": true,
        "note": null,
    })
    .into();
    assert_eq!(unflatten(&flatten(&v)).unwrap(), v);
}

#[test]
fn assign_then_read_yields_assigned_value() {
    let root = planets();
    let path: KeyPath = "pluto.population.robots".parse().unwrap();
    let updated = assign(&root, &path, json!(12).into()).unwrap();

    let read = parse("pluto.population.robots").unwrap();
    assert_eq!(glom(&updated, &read).unwrap(), json!(12).into());

    // the original root is untouched
    assert_eq!(
        glom_path(&root, "pluto.population").unwrap(),
        Value::Null
    );
}

#[test]
fn coalesce_takes_first_success_in_order() {
    let data: Value = json!({"a_ok": "A", "b_ok": "B"}).into();
    let spec = Spec::coalesce(
        [Spec::key("nope"), Spec::key("a_ok"), Spec::key("b_ok")],
        Fallback::value(Value::from("default")),
    );
    assert_eq!(glom(&data, &spec).unwrap(), Value::from("A"));
}

#[test]
fn merge_union_and_last_write_wins() {
    let union: Value = json!([{"a": 1}, {"b": 2}]).into();
    assert_eq!(glom(&union, &Spec::merge()).unwrap(), json!({"a": 1, "b": 2}).into());

    let collision: Value = json!([{"a": 1}, {"a": 2}]).into();
    assert_eq!(glom(&collision, &Spec::merge()).unwrap(), json!({"a": 2}).into());
}

#[test]
fn wildcard_search_first_and_all() {
    let data: Value = json!({"x": {"y": {"humans": 7}}, "z": {"humans": 1}}).into();
    assert_eq!(glom_path(&data, "**.humans").unwrap(), json!(7).into());
    assert_eq!(
        glom(&data, &Spec::search_all("humans")).unwrap(),
        json!([7, 1]).into()
    );
}

#[test]
fn flatten_is_exact_and_ordered() {
    let data: Value = json!({"a": [1, 2], "b": {"c": 3}}).into();
    let flat = flatten(&data);
    let entries: Vec<(&str, &Value)> = flat.iter().map(|(k, v)| (k.as_str(), v)).collect();
    assert_eq!(
        entries,
        vec![
            ("a.0", &json!(1).into()),
            ("a.1", &json!(2).into()),
            ("b.c", &json!(3).into()),
        ]
    );
}

#[test]
fn sequence_short_circuits_at_first_failure() {
    let data: Value = json!({"present": 1}).into();
    let spec = Spec::seq([Spec::key("missing"), Spec::key("anything")]);
    assert_eq!(
        glom(&data, &spec).unwrap_err(),
        EvalError::PathNotFound { path: "missing".to_string() }
    );
}

// ── Pipelines ────────────────────────────────────────────────────────────────

#[test]
fn dataset_lookup_update_and_writeback() {
    let doc = dataset();

    // first physical table entry, as a [id, table] pair
    let first_entry = Spec::seq([
        parse("DataSet.PhysicalTableMap").unwrap(),
        Spec::first(),
    ]);
    let pair = glom(&doc, &first_entry).unwrap();
    let dset_id = pair.get_index(0).and_then(|v| v.as_str()).unwrap().to_string();
    assert_eq!(dset_id, "table-7f3a");

    // the table body may live under one of several wrappers
    let table_spec = Spec::seq([
        parse(&format!("DataSet.PhysicalTableMap.{}", dset_id)).unwrap(),
        Spec::coalesce(
            [Spec::key("Other"), Spec::key("RelationalTable")],
            Fallback::value(Value::from("couldn't find")),
        ),
    ]);
    let table = glom(&doc, &table_spec).unwrap();
    assert_eq!(table.get("Name"), Some(&Value::from("orders")));

    // rename and write the table back into the document
    let renamed = assign(&table, &"Name".parse().unwrap(), Value::from("orders_v2")).unwrap();
    let path: KeyPath = format!("DataSet.PhysicalTableMap.{}", dset_id).parse().unwrap();
    let updated = assign(&doc, &path, renamed).unwrap();

    assert_eq!(
        glom_path(&updated, "DataSet.PhysicalTableMap.table-7f3a.Name").unwrap(),
        Value::from("orders_v2")
    );
    // untouched branches survive, key order intact
    assert_eq!(
        glom_path(&updated, "**.InputColumns").unwrap(),
        json!([
            {"Name": "id", "Type": "INTEGER"},
            {"Name": "total", "Type": "DECIMAL"},
        ])
        .into()
    );
}

#[test]
fn entries_iterate_merge_rebuilds_mapping() {
    // the identity dict-comprehension: entries -> {k: v} -> merge
    let spec = Spec::seq([
        Spec::entries(),
        Spec::iterate_with(
            Spec::object([(Spec::index(0), Spec::index(1))]),
            IterMode::All,
        ),
        Spec::merge(),
    ]);
    assert_eq!(glom(&planets(), &spec).unwrap(), planets());
}

#[test]
fn moons_projection_skips_planets_without_moons() {
    // collect each planet's moons count, keyed by planet name
    let spec = Spec::object([(
        Spec::literal("moons"),
        Spec::seq([
            Spec::entries(),
            Spec::iterate_with(
                Spec::object([(
                    Spec::index(0),
                    Spec::seq([Spec::index(1), Spec::key("moons")]),
                )]),
                IterMode::All,
            ),
            Spec::merge(),
        ]),
    )]);
    assert_eq!(
        glom(&planets(), &spec).unwrap(),
        json!({"moons": {"pluto": 6, "earth": 1}}).into()
    );
}

#[test]
fn dsl_and_structured_specs_agree() {
    let doc = dataset();
    let dsl = glom_path(&doc, "DataSet.PhysicalTableMap.table-7f3a.RelationalTable.InputColumns.0.Name")
        .unwrap();
    let built = glom(
        &doc,
        &Spec::seq([
            Spec::key("DataSet"),
            Spec::key("PhysicalTableMap"),
            Spec::key("table-7f3a"),
            Spec::key("RelationalTable"),
            Spec::key("InputColumns"),
            Spec::index(0),
            Spec::key("Name"),
        ]),
    )
    .unwrap();
    assert_eq!(dsl, built);
    assert_eq!(dsl, Value::from("id"));
}

#[test]
fn json_text_boundary_preserves_key_order() {
    let text = r#"{"DataSet":{"zeta":1,"alpha":{"keep":[1,2]},"mid":null}}"#;
    let v = Value::from_json_str(text).unwrap();
    assert_eq!(v.to_json_string().unwrap(), text);

    // a write appends its new key at the end of the touched object
    let updated = assign(&v, &"DataSet.new_key".parse().unwrap(), Value::from(true)).unwrap();
    assert_eq!(
        updated.to_json_string().unwrap(),
        r#"{"DataSet":{"zeta":1,"alpha":{"keep":[1,2]},"mid":null,"new_key":true}}"#
    );
}

#[test]
fn coalesce_default_factory_sees_original_input() {
    let data = planets();
    let spec = Spec::coalesce(
        [Spec::key("mars")],
        Fallback::new(|input| {
            Ok(Value::from(format!(
                "couldn't find (searched {} planets)",
                input.as_object().map_or(0, |m| m.len())
            )))
        }),
    );
    assert_eq!(
        glom(&data, &spec).unwrap(),
        Value::from("couldn't find (searched 3 planets)")
    );
}
