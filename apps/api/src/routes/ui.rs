use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// GET /
/// Serves the single-page UI with its single-analysis and bulk-ranking tabs.
pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}
