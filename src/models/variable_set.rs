//! Variable sets: nested, typed variable definitions used for annotations.
//!
//! A study holds `variableSets`; each set holds `variables`; an `OBJECT`
//! variable may hold further variables under `variableSet`, to any depth.
//!
//! The tree is edited in place on the stored JSON so that every field,
//! and the order of fields, is written back unchanged. Presence rules:
//!
//! - a set or variable that is not an object is left alone
//! - `variables` / `variableSet` are only descended into when they are
//!   arrays; absent, null or any other value means "no children"
//! - `type` is only compared when it is a string; absent, null or any
//!   other value never matches

use serde_json::Value as JsonValue;

/// Variable type tag retired in catalog v2.
pub const LEGACY_TEXT_TYPE: &str = "TEXT";
/// Replacement for [`LEGACY_TEXT_TYPE`].
pub const STRING_TYPE: &str = "STRING";

/// Variables of a set.
pub const VARIABLES_FIELD: &str = "variables";
/// Children of an `OBJECT` variable.
pub const NESTED_VARIABLES_FIELD: &str = "variableSet";
/// Type tag of a variable.
pub const TYPE_FIELD: &str = "type";

/// Renames the variable type `from` to `to` throughout `variable_sets`.
///
/// Walks every variable depth-first with an explicit stack, so nesting
/// depth is bounded by heap rather than call stack. Returns the number of
/// variables rewritten; zero means `variable_sets` is unchanged.
pub fn rewrite_variable_types(variable_sets: &mut JsonValue, from: &str, to: &str) -> usize {
    let JsonValue::Array(sets) = variable_sets else {
        return 0;
    };

    let mut stack: Vec<&mut JsonValue> = Vec::new();
    for set in sets.iter_mut().rev() {
        if let Some(JsonValue::Array(variables)) = set
            .as_object_mut()
            .and_then(|set| set.get_mut(VARIABLES_FIELD))
        {
            stack.extend(variables.iter_mut().rev());
        }
    }

    let mut rewritten = 0;
    while let Some(variable) = stack.pop() {
        let JsonValue::Object(variable) = variable else {
            continue;
        };

        if let Some(JsonValue::String(kind)) = variable.get_mut(TYPE_FIELD) {
            if kind.as_str() == from {
                *kind = to.to_string();
                rewritten += 1;
            }
        }
        if let Some(JsonValue::Array(children)) = variable.get_mut(NESTED_VARIABLES_FIELD) {
            stack.extend(children.iter_mut().rev());
        }
    }
    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rewrite(value: &mut JsonValue) -> usize {
        rewrite_variable_types(value, LEGACY_TEXT_TYPE, STRING_TYPE)
    }

    #[test]
    fn test_rewrites_top_level_and_nested_variables() {
        let mut vs = json!([{
            "id": "vs1",
            "variables": [
                {"id": "name", "type": "TEXT"},
                {"id": "age", "type": "INTEGER"},
                {"id": "address", "type": "OBJECT", "variableSet": [
                    {"id": "street", "type": "TEXT"},
                    {"id": "geo", "type": "OBJECT", "variableSet": [
                        {"id": "label", "type": "TEXT"}
                    ]}
                ]}
            ]
        }]);

        assert_eq!(rewrite(&mut vs), 3);
        assert_eq!(
            vs,
            json!([{
                "id": "vs1",
                "variables": [
                    {"id": "name", "type": "STRING"},
                    {"id": "age", "type": "INTEGER"},
                    {"id": "address", "type": "OBJECT", "variableSet": [
                        {"id": "street", "type": "STRING"},
                        {"id": "geo", "type": "OBJECT", "variableSet": [
                            {"id": "label", "type": "STRING"}
                        ]}
                    ]}
                ]
            }])
        );
    }

    #[test]
    fn test_field_order_is_kept() {
        let mut vs = json!([{
            "id": "vs",
            "variables": [{"id": "n", "type": "TEXT", "required": true}],
            "unique": false
        }]);

        assert_eq!(rewrite(&mut vs), 1);
        assert_eq!(
            serde_json::to_string(&vs).unwrap(),
            r#"[{"id":"vs","variables":[{"id":"n","type":"STRING","required":true}],"unique":false}]"#
        );
    }

    #[test]
    fn test_string_variables_are_untouched() {
        let mut vs = json!([{"variables": [{"id": "a", "type": "STRING"}]}]);
        assert_eq!(rewrite(&mut vs), 0);
    }

    #[test]
    fn test_unexpected_shapes_pass_through() {
        let original = json!([
            {"id": "vs1", "variables": null},
            {"id": "vs2"},
            {"id": "vs3", "variables": {"not": "a list"}},
            "not a set",
            {"id": "vs4", "variables": [
                {"id": "a", "type": null, "variableSet": null},
                {"id": "b", "type": 3, "variableSet": "x"},
                {"id": "c", "type": ["TEXT"]},
                7,
                {"id": "d", "type": "TEXT"}
            ]}
        ]);
        let mut vs = original.clone();

        assert_eq!(rewrite(&mut vs), 1);
        assert_eq!(vs[4]["variables"][4]["type"], json!("STRING"));
        vs[4]["variables"][4]["type"] = json!("TEXT");
        assert_eq!(vs, original);
    }

    #[test]
    fn test_non_array_root_is_ignored() {
        let mut vs = json!({"variables": [{"type": "TEXT"}]});
        assert_eq!(rewrite(&mut vs), 0);
    }

    #[test]
    fn test_deep_nesting() {
        let mut leaf = json!({"id": "leaf", "type": "TEXT"});
        for depth in 0..64 {
            leaf = json!({"id": format!("level{}", depth), "type": "OBJECT", "variableSet": [leaf]});
        }
        let mut vs = json!([{"variables": [leaf]}]);

        assert_eq!(rewrite(&mut vs), 1);

        let mut node = &vs[0]["variables"][0];
        while let Some(JsonValue::Array(children)) = node.get(NESTED_VARIABLES_FIELD) {
            node = &children[0];
        }
        assert_eq!(node["type"], json!(STRING_TYPE));
    }
}
