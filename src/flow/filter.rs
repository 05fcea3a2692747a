use serde_json::Value;

/// The `results` array of a flow response, or nothing if the response has none.
pub fn results(response: &Value) -> &[Value] {
    response
        .get("results")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Keep the results whose location description contains `needle`, ignoring case.
/// An empty needle keeps everything. Otherwise results without a description never match.
pub fn filter_results_by_description(results: &[Value], needle: &str) -> Vec<Value> {
    if needle.is_empty() {
        return results.to_vec();
    }

    let needle = needle.to_lowercase();
    results
        .iter()
        .filter(|result| {
            description(result)
                .map(|d| d.to_lowercase().contains(&needle))
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

fn description(result: &Value) -> Option<&str> {
    result
        .pointer("/location/description")
        .and_then(Value::as_str)
}
