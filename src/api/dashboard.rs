//! Server-rendered pages
//!
//! The pages are static templates; all charting happens in the browser
//! against `/api/forecast/:date`.

use axum::{
    extract::{Path, State},
    response::Html,
};
use chrono::NaiveDate;

use crate::state::AppState;

const INDEX_TEMPLATE: &str = include_str!("templates/index.html");
const DASHBOARD_TEMPLATE: &str = include_str!("templates/dashboard.html");

/// GET /
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let forecasts = state.forecasts.clone();
    let dates = tokio::task::spawn_blocking(move || forecasts.available_dates())
        .await
        .unwrap_or_default();
    Html(render_index(&dates))
}

/// GET /dashboard/:date
pub async fn dashboard(Path(date): Path<String>) -> Html<String> {
    Html(render_dashboard(&date))
}

fn render_index(dates: &[String]) -> String {
    let items = if dates.is_empty() {
        "<li class=\"empty\">No forecast days available.</li>".to_string()
    } else {
        dates
            .iter()
            .map(|d| format!("<li><a href=\"/dashboard/{d}\">{d}</a></li>"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    INDEX_TEMPLATE.replace("{{DATES}}", &items)
}

/// Only canonical dates reach the page; anything else renders the error
/// state without a fetch.
fn render_dashboard(date: &str) -> String {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    DASHBOARD_TEMPLATE.replace("{{DATE}}", &date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_links_each_date() {
        let html = render_index(&["2017-03-10".to_string(), "2017-03-11".to_string()]);
        assert!(html.contains("<a href=\"/dashboard/2017-03-10\">2017-03-10</a>"));
        assert!(html.contains("<a href=\"/dashboard/2017-03-11\">2017-03-11</a>"));
        assert!(!html.contains("{{DATES}}"));
    }

    #[test]
    fn test_index_without_dates() {
        assert!(render_index(&[]).contains("No forecast days available."));
    }

    #[test]
    fn test_dashboard_embeds_date() {
        let html = render_dashboard("2017-03-10");
        assert!(html.contains(r#"const DATE = "2017-03-10";"#));
        assert!(!html.contains("{{DATE}}"));
    }

    #[test]
    fn test_dashboard_drops_non_dates() {
        let html = render_dashboard("</script><script>alert(1)");
        assert!(html.contains(r#"const DATE = "";"#));
        assert!(!html.contains("alert(1)"));
    }
}
