//! Landing page

use crate::api::ApiError;
use crate::config::AppConfig;
use axum::response::Html;
use di_axum::Inject;
use log::{error, info};
use minijinja::{Environment, context};

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");

pub async fn index(Inject(config): Inject<AppConfig>) -> Result<Html<String>, ApiError> {
    info!("Serving landing page");

    render_index(&config).map(Html).map_err(|e| {
        error!("failed to render landing page: {e:#}");
        ApiError::Internal
    })
}

pub fn render_index(config: &AppConfig) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template("index.html", INDEX_TEMPLATE)?;
    env.get_template("index.html")?
        .render(context! { config => config })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_index_uses_config() {
        let mut config = AppConfig::default();
        config.title = "Test Chat".to_owned();
        config.theme.bg_color = "#123456".to_owned();

        let html = render_index(&config).unwrap();

        assert!(html.contains("<title>Test Chat</title>"));
        assert!(html.contains("#123456"));
        assert!(html.contains("/static/script.js"));
    }

    #[test]
    fn test_render_index_escapes_title() {
        let mut config = AppConfig::default();
        config.title = "<script>alert(1)</script>".to_owned();

        let html = render_index(&config).unwrap();

        assert!(!html.contains("<script>alert(1)</script>"));
    }
}
