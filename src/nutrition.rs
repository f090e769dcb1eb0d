use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Title used when the webhook recognized no food items.
pub const FALLBACK_MEAL_NAME: &str = "Meal Analysis";

/// One recognized food component.
///
/// Numeric fields are always finite and non-negative; anything the webhook
/// sent that could not be read as a number is stored as `0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NutritionItem {
    /// Display label. `None` if the webhook left it out.
    pub name: Option<String>,
    /// Human-readable amount, e.g. `"1 cup"` or `"150 g"`.
    pub quantity: Option<String>,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// One analysis result, as shown to the user.
///
/// Built by [`normalize`]; the four aggregate fields are never NaN or negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionData {
    pub meal_name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    /// Items in the order the webhook returned them.
    pub items: Vec<NutritionItem>,
}

impl Default for NutritionData {
    fn default() -> Self {
        Self {
            meal_name: FALLBACK_MEAL_NAME.to_string(),
            calories: 0.0,
            protein: 0.0,
            carbs: 0.0,
            fat: 0.0,
            items: Vec::new(),
        }
    }
}

/// Map whatever JSON the webhook returned into a [`NutritionData`].
///
/// The webhook's output schema is not fixed, so this accepts several shapes
/// and never fails:
///
/// - an array (only the first element is used) or a bare object;
/// - the payload wrapped in an `output` key, or sitting at the root;
/// - `output.food`: the item list (anything but an array counts as empty);
/// - `output.total`: precomputed totals. If missing or empty, totals are
///   summed from the items.
///
/// Every numeric field is coerced on its own: a bad `protein` never affects
/// `calories`.
///
/// # Example
///
/// ```rust
/// use meal_lens::nutrition::normalize;
/// use serde_json::json;
///
/// let raw = json!([{
///     "output": {
///         "food": [
///             { "name": "Apple", "calories": 95, "carbs": 25 },
///             { "name": "Toast", "calories": "80", "protein": 3 }
///         ]
///     }
/// }]);
///
/// let data = normalize(&raw);
/// assert_eq!(data.meal_name, "Meal: Apple, Toast");
/// assert_eq!(data.calories, 175.0);
/// assert_eq!(data.items.len(), 2);
/// ```
pub fn normalize(raw: &Value) -> NutritionData {
    let root = match raw {
        Value::Array(entries) => entries.first(),
        other => Some(other),
    };

    let output = root
        .and_then(|r| r.get("output"))
        .filter(|inner| !inner.is_null())
        .or(root);

    let food: &[Value] = output
        .and_then(|o| o.get("food"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let items: Vec<NutritionItem> = food.iter().map(item_from_value).collect();

    let totals = match output.and_then(|o| o.get("total")).and_then(Value::as_object) {
        Some(total) if !total.is_empty() => Totals::from_object(total),
        _ => Totals::sum(&items),
    };

    log::debug!(
        "Normalized {} food item(s), totals: {:.1} kcal",
        items.len(),
        totals.calories
    );

    NutritionData {
        meal_name: meal_name(&items),
        calories: totals.calories,
        protein: totals.protein,
        carbs: totals.carbs,
        fat: totals.fat,
        items,
    }
}

/// Calorie and macro totals.
///
/// Used both for the aggregate of a [`NutritionData`] and for the table's
/// total row (see [`crate::report::item_totals`]).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Totals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl Totals {
    /// Sum the items field by field. A sum that overflows counts as `0`.
    pub fn sum(items: &[NutritionItem]) -> Self {
        let raw = items.iter().fold(Self::default(), |acc, item| Self {
            calories: acc.calories + item.calories,
            protein: acc.protein + item.protein,
            carbs: acc.carbs + item.carbs,
            fat: acc.fat + item.fat,
        });
        Self {
            calories: amount(raw.calories),
            protein: amount(raw.protein),
            carbs: amount(raw.carbs),
            fat: amount(raw.fat),
        }
    }

    fn from_object(obj: &Map<String, Value>) -> Self {
        Self {
            calories: number_field(obj, "calories"),
            protein: number_field(obj, "protein"),
            carbs: number_field(obj, "carbs"),
            fat: number_field(obj, "fat"),
        }
    }
}

fn item_from_value(value: &Value) -> NutritionItem {
    let Some(obj) = value.as_object() else {
        return NutritionItem::default();
    };

    NutritionItem {
        name: obj.get("name").and_then(label_from_value),
        quantity: obj.get("quantity").and_then(label_from_value),
        calories: number_field(obj, "calories"),
        protein: number_field(obj, "protein"),
        carbs: number_field(obj, "carbs"),
        fat: number_field(obj, "fat"),
    }
}

/// `"Meal: A, B"` from the first two names, with `", ..."` when more follow.
fn meal_name(items: &[NutritionItem]) -> String {
    if items.is_empty() {
        return FALLBACK_MEAL_NAME.to_string();
    }

    let names: Vec<&str> = items
        .iter()
        .take(2)
        .map(|item| item.name.as_deref().unwrap_or_default())
        .collect();
    let more = if items.len() > 2 { ", ..." } else { "" };

    format!("Meal: {}{more}", names.join(", "))
}

fn number_field(obj: &Map<String, Value>, key: &str) -> f64 {
    obj.get(key).map(coerce_number).unwrap_or(0.0)
}

/// Read a JSON value as a non-negative amount.
///
/// Numbers pass through, numeric strings are parsed (an empty string is
/// `0`), booleans count as `1`/`0`. Everything else, including negative and
/// non-finite results, becomes `0`.
pub fn coerce_number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().unwrap_or(0.0)
            }
        }
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };

    amount(n)
}

fn amount(n: f64) -> f64 {
    if n.is_finite() && n > 0.0 { n } else { 0.0 }
}

/// Text fields may come back as numbers (`"quantity": 2`).
fn label_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assert_sane(data: &NutritionData) {
        for v in [data.calories, data.protein, data.carbs, data.fat] {
            assert!(v.is_finite() && v >= 0.0, "bad aggregate {v}");
        }
    }

    // ── envelope & payload ───────────────────────────────────────────

    #[test]
    fn wrapped_totals_are_taken_verbatim() {
        let raw = json!([{
            "output": {
                "food": [{ "calories": 100, "protein": 10, "carbs": 20, "fat": 5 }],
                "total": { "calories": 100, "protein": 10, "carbs": 20, "fat": 5 }
            }
        }]);

        let data = normalize(&raw);
        assert_eq!(data.calories, 100.0);
        assert_eq!(data.protein, 10.0);
        assert_eq!(data.carbs, 20.0);
        assert_eq!(data.fat, 5.0);
        assert_eq!(data.items.len(), 1);
    }

    #[test]
    fn provided_totals_win_over_item_sums() {
        let raw = json!({
            "output": {
                "food": [{ "name": "Rice", "calories": 200 }],
                "total": { "calories": 640, "protein": 12.5 }
            }
        });

        let data = normalize(&raw);
        assert_eq!(data.calories, 640.0);
        assert_eq!(data.protein, 12.5);
        assert_eq!(data.carbs, 0.0);
        assert_eq!(data.fat, 0.0);
    }

    #[test]
    fn unwrapped_root_matches_wrapped_form() {
        let payload = json!({
            "food": [
                { "name": "Apple", "calories": 95, "carbs": 25 },
                { "name": "Egg", "calories": 78, "protein": 6, "fat": 5 }
            ],
            "total": { "calories": 173, "protein": 6, "carbs": 25, "fat": 5 }
        });

        let wrapped = normalize(&json!([{ "output": payload.clone() }]));
        let bare = normalize(&payload);
        let bare_in_array = normalize(&json!([payload]));

        assert_eq!(wrapped, bare);
        assert_eq!(wrapped, bare_in_array);
    }

    #[test]
    fn null_output_falls_back_to_root() {
        let raw = json!({ "output": null, "food": [{ "name": "Soup", "calories": 120 }] });
        let data = normalize(&raw);
        assert_eq!(data.items.len(), 1);
        assert_eq!(data.calories, 120.0);
    }

    #[test]
    fn empty_array_yields_fallback() {
        let data = normalize(&json!([]));
        assert_eq!(data, NutritionData::default());
    }

    #[test]
    fn only_first_array_element_is_used() {
        let raw = json!([
            { "output": { "food": [{ "name": "First", "calories": 10 }] } },
            { "output": { "food": [{ "name": "Second", "calories": 999 }] } }
        ]);
        let data = normalize(&raw);
        assert_eq!(data.meal_name, "Meal: First");
        assert_eq!(data.calories, 10.0);
    }

    // ── totals ───────────────────────────────────────────────────────

    #[test]
    fn missing_totals_are_derived_from_items() {
        let raw = json!({
            "output": {
                "food": [
                    { "name": "Pasta", "calories": 100, "protein": 4, "carbs": 20, "fat": 1 },
                    { "name": "Sauce", "calories": 50, "protein": 1, "carbs": 5, "fat": 3 }
                ]
            }
        });

        let data = normalize(&raw);
        assert_eq!(data.calories, 150.0);
        assert_eq!(data.protein, 5.0);
        assert_eq!(data.carbs, 25.0);
        assert_eq!(data.fat, 4.0);
    }

    #[test]
    fn empty_total_object_is_treated_as_missing() {
        let raw = json!({
            "food": [{ "calories": 30 }, { "calories": "12.5" }],
            "total": {}
        });
        assert_eq!(normalize(&raw).calories, 42.5);
    }

    #[test]
    fn non_object_total_is_treated_as_missing() {
        let raw = json!({ "food": [{ "calories": 30 }], "total": 900 });
        assert_eq!(normalize(&raw).calories, 30.0);
    }

    #[test]
    fn nothing_recognized_is_all_zero() {
        let data = normalize(&json!({ "output": {} }));
        assert_eq!(data.meal_name, FALLBACK_MEAL_NAME);
        assert!(data.items.is_empty());
        assert_eq!(data.calories, 0.0);
        assert_eq!(data.protein, 0.0);
        assert_eq!(data.carbs, 0.0);
        assert_eq!(data.fat, 0.0);
    }

    #[test]
    fn totals_without_items_still_count() {
        let raw = json!({ "total": { "calories": 500, "fat": 20 } });
        let data = normalize(&raw);
        assert_eq!(data.calories, 500.0);
        assert_eq!(data.fat, 20.0);
        assert!(data.items.is_empty());
        assert_eq!(data.meal_name, FALLBACK_MEAL_NAME);
    }

    // ── meal name ────────────────────────────────────────────────────

    #[test]
    fn meal_name_truncates_after_two_items() {
        let raw = json!({
            "food": [{ "name": "Apple" }, { "name": "Toast" }, { "name": "Egg" }]
        });
        assert_eq!(normalize(&raw).meal_name, "Meal: Apple, Toast, ...");
    }

    #[test]
    fn meal_name_with_one_and_two_items() {
        let one = json!({ "food": [{ "name": "Salad" }] });
        let two = json!({ "food": [{ "name": "Salad" }, { "name": "Bread" }] });
        assert_eq!(normalize(&one).meal_name, "Meal: Salad");
        assert_eq!(normalize(&two).meal_name, "Meal: Salad, Bread");
    }

    #[test]
    fn meal_name_tolerates_missing_names() {
        let raw = json!({ "food": [{ "calories": 10 }, { "name": "Tea" }] });
        assert_eq!(normalize(&raw).meal_name, "Meal: , Tea");
    }

    // ── items ────────────────────────────────────────────────────────

    #[test]
    fn items_keep_order_and_text_fields() {
        let raw = json!({
            "food": [
                { "name": "Oats", "quantity": "1 cup", "calories": 150 },
                { "name": "Milk", "quantity": 200, "calories": 100 }
            ]
        });
        let data = normalize(&raw);
        assert_eq!(data.items[0].name.as_deref(), Some("Oats"));
        assert_eq!(data.items[0].quantity.as_deref(), Some("1 cup"));
        assert_eq!(data.items[1].name.as_deref(), Some("Milk"));
        assert_eq!(data.items[1].quantity.as_deref(), Some("200"));
    }

    #[test]
    fn bad_fields_are_zeroed_independently() {
        let raw = json!({
            "food": [{ "name": "Mystery", "calories": 210, "protein": "lots", "carbs": null, "fat": [1] }]
        });
        let item = &normalize(&raw).items[0];
        assert_eq!(item.calories, 210.0);
        assert_eq!(item.protein, 0.0);
        assert_eq!(item.carbs, 0.0);
        assert_eq!(item.fat, 0.0);
    }

    #[test]
    fn non_object_items_become_empty_rows() {
        let raw = json!({ "food": ["banana", 42, null] });
        let data = normalize(&raw);
        assert_eq!(data.items.len(), 3);
        assert!(data.items.iter().all(|i| i.name.is_none() && i.calories == 0.0));
    }

    #[test]
    fn food_that_is_not_a_list_is_ignored() {
        let raw = json!({ "food": { "name": "Pizza", "calories": 800 } });
        let data = normalize(&raw);
        assert!(data.items.is_empty());
        assert_eq!(data.calories, 0.0);
    }

    // ── totality ─────────────────────────────────────────────────────

    #[test]
    fn arbitrary_shapes_never_panic() {
        let inputs = [
            json!(null),
            json!(true),
            json!(12),
            json!("hello"),
            json!([null]),
            json!([[]]),
            json!({ "output": "text" }),
            json!({ "output": [1, 2, 3] }),
            json!({ "output": { "food": null, "total": null } }),
            json!({ "food": [{ "calories": -50, "protein": 1e308, "fat": "1e400" }] }),
            json!({ "total": { "calories": "NaN", "protein": "inf", "carbs": -3 } }),
            json!({ "food": [
                { "name": "A", "calories": 1e308, "fat": 1.5e308 },
                { "name": "B", "calories": 1e308, "fat": 1.5e308 },
            ] }),
        ];

        for input in &inputs {
            let data = normalize(input);
            assert_sane(&data);
        }
    }

    #[test]
    fn derived_totals_that_overflow_become_zero() {
        let raw = json!({ "food": [
            { "name": "A", "calories": 1e308, "protein": 4 },
            { "name": "B", "calories": 1e308, "protein": 6 },
        ] });
        let data = normalize(&raw);
        assert_eq!(data.calories, 0.0);
        assert_eq!(data.protein, 10.0);
        assert_eq!(Totals::sum(&data.items).calories, 0.0);
    }

    // ── coerce_number ────────────────────────────────────────────────

    #[test]
    fn coerce_number_cases() {
        assert_eq!(coerce_number(&json!(12)), 12.0);
        assert_eq!(coerce_number(&json!(3.5)), 3.5);
        assert_eq!(coerce_number(&json!(" 7.25 ")), 7.25);
        assert_eq!(coerce_number(&json!("")), 0.0);
        assert_eq!(coerce_number(&json!("12g")), 0.0);
        assert_eq!(coerce_number(&json!(true)), 1.0);
        assert_eq!(coerce_number(&json!(false)), 0.0);
        assert_eq!(coerce_number(&json!(null)), 0.0);
        assert_eq!(coerce_number(&json!({ "value": 3 })), 0.0);
    }

    #[test]
    fn coerce_number_rejects_negative_and_non_finite() {
        assert_eq!(coerce_number(&json!(-4)), 0.0);
        assert_eq!(coerce_number(&json!("-4")), 0.0);
        assert_eq!(coerce_number(&json!("NaN")), 0.0);
        assert_eq!(coerce_number(&json!("inf")), 0.0);
        assert_eq!(coerce_number(&json!("1e400")), 0.0);
    }

    // ── serde ────────────────────────────────────────────────────────

    #[test]
    fn serializes_meal_name_in_camel_case() {
        let data = NutritionData::default();
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["mealName"], FALLBACK_MEAL_NAME);
        assert!(value["items"].as_array().unwrap().is_empty());
    }
}
