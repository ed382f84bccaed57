use jsonassert_diff::Differ;
use jsonassert_format::{reduce_diff, AsciiFormatter};
use jsonassert_types::JsonValue;
use jsonassert_vars::VarStore;
use serde::Serialize;
use tracing::debug;

use crate::config::CompareOptions;
use crate::error::{CompareError, CompareResult};
use crate::filter::{capture_value, DeltaFilter};

/// Compares JSON documents and explains the differences.
///
/// Strict entry points (`fail_not_equal*`) report every difference. Subset
/// entry points (`fail_mismatch*`) tolerate members and elements that only
/// the actual document has.
///
/// With a [`VarStore`] attached, string values in the expected document that
/// name a variable act as placeholders: the first comparison captures the
/// actual value, later ones require it.
pub struct Comparer<'v> {
    options: CompareOptions,
    vars: Option<&'v mut dyn VarStore>,
}

impl Default for Comparer<'_> {
    fn default() -> Self {
        Self::new(CompareOptions::default())
    }
}

impl<'v> Comparer<'v> {
    pub fn new(options: CompareOptions) -> Self {
        Self {
            options,
            vars: None,
        }
    }

    /// Resolve and capture placeholders in `vars`.
    pub fn with_vars(mut self, vars: &'v mut dyn VarStore) -> Self {
        self.vars = Some(vars);
        self
    }

    pub fn options(&self) -> &CompareOptions {
        &self.options
    }

    /// The attached variable store, if any.
    pub fn vars(&self) -> Option<&dyn VarStore> {
        self.vars.as_deref()
    }

    /// Compare two JSON payloads, reporting every difference.
    pub fn fail_not_equal(&mut self, expected: &[u8], actual: &[u8]) -> CompareResult<()> {
        let (expected, actual) = decode(expected, actual)?;
        self.compare(&expected, &actual, true)
    }

    /// Compare two JSON payloads, ignoring additions in `actual`.
    pub fn fail_mismatch(&mut self, expected: &[u8], actual: &[u8]) -> CompareResult<()> {
        let (expected, actual) = decode(expected, actual)?;
        self.compare(&expected, &actual, false)
    }

    pub fn fail_not_equal_values(
        &mut self,
        expected: &JsonValue,
        actual: &JsonValue,
    ) -> CompareResult<()> {
        self.compare(expected, actual, true)
    }

    pub fn fail_mismatch_values(
        &mut self,
        expected: &JsonValue,
        actual: &JsonValue,
    ) -> CompareResult<()> {
        self.compare(expected, actual, false)
    }

    /// Serialize `actual` and compare it with the `expected` payload.
    pub fn fail_not_equal_marshal<T: Serialize + ?Sized>(
        &mut self,
        expected: &[u8],
        actual: &T,
    ) -> CompareResult<()> {
        let (expected, actual) = decode_marshal(expected, actual)?;
        self.compare(&expected, &actual, true)
    }

    /// Serialize `actual` and compare it with the `expected` payload,
    /// ignoring additions.
    pub fn fail_mismatch_marshal<T: Serialize + ?Sized>(
        &mut self,
        expected: &[u8],
        actual: &T,
    ) -> CompareResult<()> {
        let (expected, actual) = decode_marshal(expected, actual)?;
        self.compare(&expected, &actual, false)
    }

    fn compare(
        &mut self,
        expected: &JsonValue,
        actual: &JsonValue,
        keep_additions: bool,
    ) -> CompareResult<()> {
        debug!(
            expected = %expected.kind(),
            actual = %actual.kind(),
            keep_additions,
            "comparing documents"
        );

        let expected = match self.vars.as_deref() {
            Some(vars) => vars.substitute(expected),
            None => expected.clone(),
        };

        if let Some(vars) = self.vars.as_deref_mut() {
            if let Some(name) = vars.placeholder(&expected) {
                if vars.get(name).is_none() {
                    vars.set(name, capture_value(actual));
                    return Ok(());
                }
            }
        }
        let ignore_diff = self.options.ignore_diff.as_str();
        if !ignore_diff.is_empty() && expected.as_str() == Some(ignore_diff) {
            return Ok(());
        }

        let diff = Differ::new(self.options.diff.clone()).diff(&expected, actual)?;
        if !diff.is_modified() {
            debug!("documents are equal");
            return Ok(());
        }
        let raw = diff.len();

        let mut filter = DeltaFilter::new(&self.options.ignore_diff, keep_additions);
        if let Some(vars) = self.vars.as_mut() {
            filter = filter.with_vars(&mut **vars);
        }
        let deltas = filter.filter(diff.into_deltas());
        debug!(raw, kept = deltas.len(), "filtered deltas");
        if deltas.is_empty() {
            return Ok(());
        }

        let text = AsciiFormatter::new(&expected, self.options.format.clone())
            .format(&deltas)
            .map_err(|err| CompareError::Internal(err.to_string()))?;
        let diff = if self.options.keep_full_diff {
            text
        } else {
            reduce_diff(
                &text,
                self.options.full_diff_max_lines,
                self.options.diff_surrounding_lines,
            )
        };
        Err(CompareError::NotEqual { diff })
    }
}

fn decode(expected: &[u8], actual: &[u8]) -> CompareResult<(JsonValue, JsonValue)> {
    let expected = JsonValue::from_slice(expected).map_err(CompareError::DecodeExpected)?;
    let actual = JsonValue::from_slice(actual).map_err(CompareError::DecodeActual)?;
    Ok((expected, actual))
}

fn decode_marshal<T: Serialize + ?Sized>(
    expected: &[u8],
    actual: &T,
) -> CompareResult<(JsonValue, JsonValue)> {
    let actual = JsonValue::from_serialize(actual).map_err(CompareError::Marshal)?;
    let expected = JsonValue::from_slice(expected).map_err(CompareError::DecodeExpected)?;
    Ok((expected, actual))
}

/// Compare two JSON payloads with default options, reporting every difference.
pub fn fail_not_equal(expected: &[u8], actual: &[u8]) -> CompareResult<()> {
    Comparer::default().fail_not_equal(expected, actual)
}

/// Compare two JSON payloads with default options, ignoring additions.
pub fn fail_mismatch(expected: &[u8], actual: &[u8]) -> CompareResult<()> {
    Comparer::default().fail_mismatch(expected, actual)
}

pub fn fail_not_equal_marshal<T: Serialize + ?Sized>(
    expected: &[u8],
    actual: &T,
) -> CompareResult<()> {
    Comparer::default().fail_not_equal_marshal(expected, actual)
}

pub fn fail_mismatch_marshal<T: Serialize + ?Sized>(
    expected: &[u8],
    actual: &T,
) -> CompareResult<()> {
    Comparer::default().fail_mismatch_marshal(expected, actual)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonassert_types::{JsonNumber, ValueKind};
    use jsonassert_vars::Vars;
    use proptest::prelude::*;
    use serde_json::json;

    fn v(value: serde_json::Value) -> JsonValue {
        JsonValue::from(value)
    }

    fn not_equal_text(result: CompareResult<()>) -> String {
        result.unwrap_err().to_string()
    }

    #[test]
    fn equality_cases() {
        let cases: &[(&str, &str, bool)] = &[
            ("{", "{}", false),
            ("{}", "{", false),
            ("{}", "[]", false),
            ("[]", "{}", false),
            ("[]", "[]", true),
            ("123", "321", false),
            ("123", "123", true),
            (r#"[{}, {"val": "<ignore-diff>"}, {}]"#, r#"[{"val": 123}]"#, false),
            (r#"{"a": [1, {"val": "<ignore-diff>"}, 3]}"#, r#"{"a": [1, {"val": 123}, 3]}"#, true),
        ];
        for (expected, actual, equal) in cases {
            let result = fail_not_equal(expected.as_bytes(), actual.as_bytes());
            assert_eq!(result.is_ok(), *equal, "{expected} vs {actual}: {result:?}");
        }
    }

    #[test]
    fn decode_errors_name_the_side() {
        let err = fail_not_equal(b"{", b"{}").unwrap_err();
        assert!(matches!(err, CompareError::DecodeExpected(_)));
        assert!(err.to_string().starts_with("failed to unmarshal expected:\n"));
        assert!(!err.is_mismatch());

        let err = fail_mismatch(b"{}", b"{").unwrap_err();
        assert!(matches!(err, CompareError::DecodeActual(_)));
    }

    #[test]
    fn root_mismatches() {
        let err = fail_not_equal(b"{}", b"[]").unwrap_err();
        assert!(matches!(
            err,
            CompareError::RootTypeMismatch {
                expected: ValueKind::Object,
                actual: ValueKind::Array
            }
        ));
        assert_eq!(err.to_string(), "types mismatch, object expected, got array");

        let err = fail_not_equal(b"123", b"321").unwrap_err();
        assert_eq!(err.to_string(), "values 123 and 321 are not equal");
        assert!(err.is_mismatch());
    }

    #[test]
    fn root_ignore_marker_matches_anything() {
        assert!(fail_not_equal(br#""<ignore-diff>""#, br#"{"a": 1}"#).is_ok());
        assert!(fail_mismatch(br#""<ignore-diff>""#, b"42").is_ok());
    }

    #[test]
    fn ignore_marker_matches_nested_containers() {
        assert!(fail_not_equal(br#"{"a": "<ignore-diff>"}"#, br#"{"a": {"x": [1]}}"#).is_ok());
        assert!(fail_mismatch(br#"{"a": ["<ignore-diff>"]}"#, br#"{"a": [[{"b": 1}]], "c": 2}"#).is_ok());
    }

    #[test]
    fn message_lists_unignored_changes() {
        let expected = br#"{
          "name": "Bob",
          "createdAt": "<ignore-diff>",
          "id": "<ignore-diff>",
          "nested": {"val": "<ignore-diff>"},
          "items": [{"val": "<ignore-diff>"}, {"val": 123}, {"val": "<ignore-diff>"}]
        }"#;
        let actual = br#"{
          "createdAt": "2018-08-01T00:01:02Z",
          "id": "123",
          "nested": {"val": "random"},
          "name": "Alice",
          "items": [{"val": "bar"}, {"val": 321}, {"val": "foo"}]
        }"#;
        let text = not_equal_text(fail_not_equal(expected, actual));
        assert_eq!(
            text,
            concat!(
                "not equal:\n",
                " {\n",
                "   \"createdAt\": \"<ignore-diff>\",\n",
                "   \"id\": \"<ignore-diff>\",\n",
                "   \"items\": [\n",
                "     {\n",
                "       \"val\": \"<ignore-diff>\"\n",
                "     },\n",
                "     {\n",
                "-      \"val\": 123\n",
                "+      \"val\": 321\n",
                "     },\n",
                "     {\n",
                "       \"val\": \"<ignore-diff>\"\n",
                "     }\n",
                "   ],\n",
                "-  \"name\": \"Bob\",\n",
                "+  \"name\": \"Alice\",\n",
                "   \"nested\": {\n",
                "     \"val\": \"<ignore-diff>\"\n",
                "   }\n",
                " }\n",
            )
        );
    }

    #[test]
    fn exact_options_compare_the_marker_literally() {
        let mut comparer = Comparer::new(CompareOptions::exact());
        assert!(comparer
            .fail_not_equal(
                br#"{"a": [1, {"val": "<ignore-diff>"}, 3]}"#,
                br#"{"a": [1, {"val": 123}, 3]}"#
            )
            .is_err());
        assert!(comparer
            .fail_not_equal(br#"{"a": [1, {"val": 123}, 3]}"#, br#"{"a": [1, {"val": 123}, 3]}"#)
            .is_ok());
    }

    #[test]
    fn custom_ignore_marker() {
        let mut comparer = Comparer::new(CompareOptions {
            ignore_diff: "Hello, World!".to_owned(),
            ..Default::default()
        });
        let cases: &[(&str, &str, bool)] = &[
            (r#"{"a": [1, {"val": "<ignore-diff>"}, 3]}"#, r#"{"a": [1, {"val": 123}, 3]}"#, false),
            (r#"{"a": [1, {"val": "Hello, World!"}, 3]}"#, r#"{"a": [1, {"val": 123}, 3]}"#, true),
            (r#"{"a": [1, {"val": 123}, 3]}"#, r#"{"a": [1, {"val": "Hello, World!"}, 3]}"#, false),
            (r#"{"a": [1, {"val": 123}, 3]}"#, r#"{"a": [1, {"val": 123}, 3]}"#, true),
        ];
        for (expected, actual, equal) in cases {
            let result = comparer.fail_not_equal(expected.as_bytes(), actual.as_bytes());
            assert_eq!(result.is_ok(), *equal, "{expected} vs {actual}");
        }
    }

    #[test]
    fn strict_and_subset_modes() {
        let actual = json!({"a": 1, "b": 2, "c": {"d": 1, "e": 2}});
        let expected = br#"{"a": 1, "c": {"d": 1}}"#;
        let mismatched = br#"{"a": 1, "c": {"d": 2}}"#;

        assert_eq!(
            not_equal_text(fail_not_equal_marshal(expected, &actual)),
            "not equal:\n {\n   \"a\": 1,\n   \"c\": {\n     \"d\": 1,\n+    \"e\": 2\n   },\n+  \"b\": 2\n }\n"
        );
        assert!(fail_mismatch_marshal(expected, &actual).is_ok());
        assert!(fail_mismatch(expected, actual.to_string().as_bytes()).is_ok());
        assert_eq!(
            not_equal_text(fail_mismatch_marshal(mismatched, &actual)),
            "not equal:\n {\n   \"a\": 1,\n   \"c\": {\n-    \"d\": 2\n+    \"d\": 1\n   }\n }\n"
        );
    }

    #[test]
    fn subset_mode_still_reports_deletions() {
        let err = fail_mismatch(br#"{"a": 1, "b": [1, 2]}"#, br#"{"a": 1, "b": [1], "c": 3}"#)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "not equal:\n {\n   \"a\": 1,\n   \"b\": [\n     1,\n-    2\n   ]\n }\n"
        );
    }

    #[test]
    fn marshal_struct() {
        #[derive(Serialize)]
        struct Sample {
            a: i32,
            b: String,
        }
        let sample = Sample {
            a: 123,
            b: "abc".to_owned(),
        };
        assert!(fail_not_equal_marshal(br#"{"a":123,"b":"abc"}"#, &sample).is_ok());
        assert!(fail_not_equal_marshal(br#"{"a":124,"b":"abc"}"#, &sample).is_err());
    }

    #[test]
    fn values_entry_points() {
        let mut comparer = Comparer::default();
        let expected = v(json!({"a": [1, 2]}));
        assert!(comparer
            .fail_mismatch_values(&expected, &v(json!({"a": [1, 2], "b": 0})))
            .is_ok());
        assert!(comparer
            .fail_not_equal_values(&expected, &v(json!({"a": [1, 2], "b": 0})))
            .is_err());
    }

    #[test]
    fn variables_capture_and_check() {
        let mut vars = Vars::new();
        vars.set("$varB", v(json!([1, 2, 3])));
        vars.set("$varC", v(json!("abc")));
        let expected = br#"{"a": "$varA", "b": "$varB", "c": "$varC", "d": "$varD"}"#;

        {
            let mut comparer = Comparer::default().with_vars(&mut vars);
            comparer
                .fail_not_equal(expected, br#"{"a": 1.23, "b": [1, 2, 3], "c": "abc", "d": 4}"#)
                .unwrap();
            let err = comparer
                .fail_not_equal(expected, br#"{"a": 1.23, "b": [1, 2, 4], "c": "abc", "d": 4}"#)
                .unwrap_err();
            assert_eq!(
                err.to_string(),
                "not equal:\n {\n   \"a\": 1.23,\n   \"b\": [\n     1,\n     2,\n-    3\n+    4\n   ],\n   \"c\": \"abc\",\n   \"d\": 4\n }\n"
            );
        }

        assert!(matches!(
            vars.get("$varA"),
            Some(JsonValue::Number(JsonNumber::Float(f))) if *f == 1.23
        ));
        assert!(matches!(
            vars.get("$varD"),
            Some(JsonValue::Number(JsonNumber::Int(4)))
        ));
    }

    #[test]
    fn mismatched_variable_reports_captured_value() {
        let mut vars = Vars::new();
        let mut comparer = Comparer::default().with_vars(&mut vars);
        comparer.fail_not_equal(br#"{"id": "$id"}"#, br#"{"id": 7}"#).unwrap();
        let err = comparer
            .fail_not_equal(br#"{"id": "$id", "x": "$id"}"#, br#"{"id": 7, "x": 8}"#)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "not equal:\n {\n   \"id\": 7,\n-  \"x\": 7\n+  \"x\": 8\n }\n"
        );
    }

    #[test]
    fn root_variables() {
        let mut vars = Vars::new();
        {
            let mut comparer = Comparer::default().with_vars(&mut vars);
            comparer.fail_not_equal(br#"["$varA"]"#, b"[123]").unwrap();

            comparer.fail_not_equal(br#""$varB""#, b"[123]").unwrap();
            assert_eq!(
                comparer
                    .fail_not_equal(br#""$varB""#, b"[124]")
                    .unwrap_err()
                    .to_string(),
                "not equal:\n [\n-  123\n+  124\n ]\n"
            );
            comparer.fail_not_equal(br#""$varB""#, b"[123]").unwrap();
            assert!(comparer.vars().is_some());
        }
        assert!(matches!(
            vars.get("$varA"),
            Some(JsonValue::Number(JsonNumber::Int(123)))
        ));
        assert_eq!(vars.get("$varB"), Some(&v(json!([123]))));
    }

    #[test]
    fn large_unsigned_integers_survive_capture() {
        let mut vars = Vars::new();
        let mut comparer = Comparer::default().with_vars(&mut vars);
        comparer
            .fail_not_equal(br#""$varC""#, br#"{"a":17294094973108486143}"#)
            .unwrap();
        assert_eq!(
            comparer
                .fail_not_equal(br#""$varC""#, br#"{"a":17294094973108486144}"#)
                .unwrap_err()
                .to_string(),
            "not equal:\n {\n-  \"a\": 17294094973108486143\n+  \"a\": 17294094973108486144\n }\n"
        );
        comparer
            .fail_not_equal(br#""$varC""#, br#"{"a":17294094973108486143}"#)
            .unwrap();
        drop(comparer);

        let captured = vars.get("$varC").and_then(JsonValue::as_object).unwrap();
        assert!(matches!(
            captured.get("a"),
            Some(JsonValue::Number(JsonNumber::UInt(17294094973108486143)))
        ));
    }

    fn long_documents() -> (JsonValue, JsonValue) {
        let expected: serde_json::Map<String, serde_json::Value> =
            (0..100).map(|n| (format!("k{n:03}"), json!(n))).collect();
        let mut actual = expected.clone();
        actual.insert("k050".to_owned(), json!(-50));
        (
            v(serde_json::Value::Object(expected)),
            v(serde_json::Value::Object(actual)),
        )
    }

    #[test]
    fn long_diff_is_reduced() {
        let (expected, actual) = long_documents();
        let text = not_equal_text(Comparer::default().fail_not_equal_values(&expected, &actual));

        let mut want = String::from("not equal:\n...\n");
        for n in 45..50 {
            want.push_str(&format!("   \"k{n:03}\": {n},\n"));
        }
        want.push_str("-  \"k050\": 50,\n+  \"k050\": -50,\n");
        for n in 51..56 {
            want.push_str(&format!("   \"k{n:03}\": {n},\n"));
        }
        want.push_str("...\n");
        assert_eq!(text, want);
    }

    #[test]
    fn keep_full_diff_skips_reduction() {
        let (expected, actual) = long_documents();
        let mut comparer = Comparer::new(CompareOptions {
            keep_full_diff: true,
            ..Default::default()
        });
        let text = not_equal_text(comparer.fail_not_equal_values(&expected, &actual));
        assert_eq!(text.lines().count(), 1 + 103);
        assert!(!text.contains("..."));
    }

    #[test]
    fn colored_output() {
        let mut comparer = Comparer::new(CompareOptions {
            format: jsonassert_format::FormatOptions {
                coloring: true,
                ..Default::default()
            },
            ..Default::default()
        });
        let text = not_equal_text(comparer.fail_not_equal(br#"{"a": 1}"#, br#"{"a": 2}"#));
        assert_eq!(
            text,
            "not equal:\n {\n\x1b[30;41m-  \"a\": 1\x1b[0m\n\x1b[30;42m+  \"a\": 2\x1b[0m\n }\n"
        );
    }

    proptest! {
        #[test]
        fn comparison_is_reflexive(members in prop::collection::btree_map("[a-d]{1,3}", -5i64..5, 0..8)) {
            let doc = v(json!(members));
            prop_assert!(fail_not_equal(doc.to_json_string().as_bytes(), doc.to_json_string().as_bytes()).is_ok());
        }

        #[test]
        fn additions_are_tolerated_in_subset_mode(
            members in prop::collection::btree_map("[a-d]{1,3}", -5i64..5, 0..8),
            extra in prop::collection::btree_map("x[a-d]{1,3}", -5i64..5, 1..4),
        ) {
            let expected = v(json!(members));
            let mut all = members.clone();
            all.extend(extra);
            let actual = v(json!(all));
            let mut comparer = Comparer::default();
            prop_assert!(comparer.fail_mismatch_values(&expected, &actual).is_ok());
            prop_assert!(comparer.fail_not_equal_values(&expected, &actual).is_err());
        }
    }
}
