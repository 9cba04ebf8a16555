use serde_json::Value;

use crate::models::ChartKind;

/// Display colors for the store registry. Unknown names get no color.
const STORE_COLORS: &[(&str, &str)] = &[
    ("台北門市", "#3B82F6"),
    ("台中門市", "#10B981"),
    ("高雄門市", "#F59E0B"),
    ("網路商店", "#8B5CF6"),
];

/// Key under which a row's presentation color is attached.
const COLOR_KEY: &str = "_color";

const TREND_KEYWORDS: &[&str] = &[
    "趨勢", "走勢", "變化", "成長", "每月", "每週", "每天", "每日", "逐月", "逐週",
    "trend", "over time", "monthly", "weekly", "daily",
];

const DATE_LABEL_KEYWORDS: &[&str] = &[
    "月", "日期", "週", "年", "期間", "date", "month", "week", "day", "year", "time",
];

const RANKING_KEYWORDS: &[&str] = &[
    "排名", "排行", "前幾", "前十", "前五", "前三", "最多", "最高", "最低", "最好", "最差",
    "各門市", "各店", "各分店", "top", "rank", "best", "worst",
];

const PROPORTION_KEYWORDS: &[&str] = &[
    "占比", "佔比", "比例", "分布", "分佈", "百分比", "結構",
    "share", "proportion", "percentage", "distribution",
];

const COMPARISON_KEYWORDS: &[&str] = &[
    "比較", "對比", "相比", "差異", "vs", "versus", "compare",
];

#[derive(Debug, Clone)]
pub struct ShapedResult {
    pub chart: ChartKind,
    pub rows: Vec<Value>,
    pub summary: String,
}

/// Infer a chart shape, decorate rows with store colors, and build the terse
/// literal summary. Pure and deterministic; the narrative belongs to the
/// insight generator.
pub fn shape(question: &str, rows: Vec<Value>) -> ShapedResult {
    let chart = infer_chart(question, &rows);
    let summary = summarize(&rows);
    let rows = decorate_rows(rows);
    ShapedResult { chart, rows, summary }
}

/// Ordered decision table; first match wins. The order is part of the
/// contract: reordering changes chart choice for ambiguous questions.
fn infer_chart(question: &str, rows: &[Value]) -> ChartKind {
    if rows.is_empty() {
        return ChartKind::None;
    }
    if rows.len() == 1 {
        return ChartKind::Table;
    }

    let lowered = question.to_lowercase();
    let labels = column_labels(&rows[0]);

    if contains_any(&lowered, TREND_KEYWORDS)
        || labels
            .iter()
            .any(|label| contains_any(&label.to_lowercase(), DATE_LABEL_KEYWORDS))
    {
        return ChartKind::Line;
    }
    if contains_any(&lowered, RANKING_KEYWORDS) {
        return ChartKind::Bar;
    }
    if contains_any(&lowered, PROPORTION_KEYWORDS) {
        return ChartKind::Pie;
    }
    if contains_any(&lowered, COMPARISON_KEYWORDS) {
        return ChartKind::Grouped;
    }

    if rows.len() <= 10 && labels.len() <= 3 {
        ChartKind::Bar
    } else {
        ChartKind::Table
    }
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| text.contains(keyword))
}

fn column_labels(row: &Value) -> Vec<String> {
    match row {
        Value::Object(map) => map.keys().cloned().collect(),
        _ => Vec::new(),
    }
}

/// Attach a presentation color to rows whose values name a known store.
/// Every other value is passed through untouched.
fn decorate_rows(rows: Vec<Value>) -> Vec<Value> {
    rows.into_iter()
        .map(|row| match row {
            Value::Object(mut map) => {
                let color = map.values().find_map(|value| match value {
                    Value::String(text) => STORE_COLORS
                        .iter()
                        .find(|(store, _)| store == text)
                        .map(|(_, color)| *color),
                    _ => None,
                });
                if let Some(color) = color {
                    map.insert(COLOR_KEY.to_string(), Value::String(color.to_string()));
                }
                Value::Object(map)
            }
            other => other,
        })
        .collect()
}

fn summarize(rows: &[Value]) -> String {
    if rows.is_empty() {
        return "查詢沒有找到符合條件的資料。".to_string();
    }

    if rows.len() == 1 {
        if let Value::Object(map) = &rows[0] {
            if map.len() <= 2 {
                return map
                    .iter()
                    .map(|(label, value)| format!("{}: {}", label, render_scalar(value)))
                    .collect::<Vec<_>>()
                    .join("，");
            }
        }
    }

    format!("查詢到 {} 筆結果。", rows.len())
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "無".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store_rows(count: usize) -> Vec<Value> {
        (0..count)
            .map(|i| json!({"門市": format!("門市{}", i), "營收": 1000 * (i + 1)}))
            .collect()
    }

    #[test]
    fn test_zero_rows_no_chart_fixed_summary() {
        let shaped = shape("上個月營收多少？", vec![]);
        assert_eq!(shaped.chart, ChartKind::None);
        assert_eq!(shaped.summary, "查詢沒有找到符合條件的資料。");
        assert!(shaped.rows.is_empty());
    }

    #[test]
    fn test_ranking_question_yields_bar() {
        let shaped = shape("上個月各門市的營收排名？", store_rows(5));
        assert_eq!(shaped.chart, ChartKind::Bar);
        assert_eq!(shaped.summary, "查詢到 5 筆結果。");
    }

    #[test]
    fn test_single_row_renders_as_table_with_readout() {
        let shaped = shape("上個月總營收？", vec![json!({"營收": 123456})]);
        assert_eq!(shaped.chart, ChartKind::Table);
        assert_eq!(shaped.summary, "營收: 123456");
    }

    #[test]
    fn test_single_row_two_columns_readout() {
        let shaped = shape("最新一筆交易？", vec![json!({"門市": "台北門市", "金額": 500})]);
        assert_eq!(shaped.summary, "門市: 台北門市，金額: 500");
    }

    #[test]
    fn test_single_wide_row_counts_instead() {
        let row = json!({"a": 1, "b": 2, "c": 3});
        let shaped = shape("明細？", vec![row]);
        assert_eq!(shaped.summary, "查詢到 1 筆結果。");
    }

    #[test]
    fn test_trend_question_yields_line() {
        let shaped = shape("近半年的營收趨勢", store_rows(6));
        assert_eq!(shaped.chart, ChartKind::Line);
    }

    #[test]
    fn test_date_column_label_yields_line() {
        let rows: Vec<Value> = (1..=6).map(|m| json!({"月份": m, "營收": m * 100})).collect();
        let shaped = shape("營收狀況", rows);
        assert_eq!(shaped.chart, ChartKind::Line);
    }

    #[test]
    fn test_proportion_question_yields_pie() {
        let rows: Vec<Value> =
            (0..3).map(|i| json!({"分類": format!("c{}", i), "數量": i})).collect();
        let shaped = shape("各分類商品的占比", rows);
        assert_eq!(shaped.chart, ChartKind::Pie);
    }

    #[test]
    fn test_comparison_question_yields_grouped() {
        let rows: Vec<Value> =
            (0..4).map(|i| json!({"組": format!("g{}", i), "值": i})).collect();
        let shaped = shape("線上與門市通路的對比", rows);
        assert_eq!(shaped.chart, ChartKind::Grouped);
    }

    #[test]
    fn test_ranking_wins_over_comparison_by_order() {
        // Both 排名 and 比較 phrasing present; rule order decides
        let shaped = shape("比較各門市營收排名", store_rows(4));
        assert_eq!(shaped.chart, ChartKind::Bar);
    }

    #[test]
    fn test_fallback_small_result_is_bar_large_is_table() {
        let shaped = shape("會員等級人數", store_rows(4));
        assert_eq!(shaped.chart, ChartKind::Bar);

        let shaped = shape("會員等級人數", store_rows(30));
        assert_eq!(shaped.chart, ChartKind::Table);
    }

    #[test]
    fn test_chart_inference_is_deterministic() {
        let first = shape("上個月各門市的營收排名？", store_rows(5)).chart;
        for _ in 0..10 {
            assert_eq!(shape("上個月各門市的營收排名？", store_rows(5)).chart, first);
        }
    }

    #[test]
    fn test_known_store_rows_get_color() {
        let rows = vec![
            json!({"門市": "台北門市", "營收": 100}),
            json!({"門市": "不存在的店", "營收": 200}),
        ];
        let shaped = shape("各門市營收排名", rows);
        assert_eq!(shaped.rows[0]["_color"], json!("#3B82F6"));
        assert!(shaped.rows[1].get("_color").is_none());
        // Original values untouched
        assert_eq!(shaped.rows[0]["營收"], json!(100));
    }
}
