//! HTML page rendering

use minijinja::{context, Environment};
use url::Url;

use crate::analysis::AnalysisReport;

/// Compiled page templates
pub struct PageRenderer {
    env: Environment<'static>,
}

impl PageRenderer {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("base.html", include_str!("../../templates/base.html"))?;
        env.add_template("index.html", include_str!("../../templates/index.html"))?;
        env.add_template("results.html", include_str!("../../templates/results.html"))?;
        Ok(Self { env })
    }

    /// Form page, optionally with an error and the previously submitted URL
    pub fn render_index(&self, error: Option<&str>, prev_url: Option<&str>) -> Result<String, minijinja::Error> {
        self.env.get_template("index.html")?.render(context! {
            error => error,
            prev_url => prev_url,
        })
    }

    pub fn render_results(&self, report: &AnalysisReport) -> Result<String, minijinja::Error> {
        self.env.get_template("results.html")?.render(context! {
            youtube_url => &report.youtube_url,
            youtube_href => web_link(&report.youtube_url),
            image_file => &report.image_url,
            comments => &report.records,
            total_comments => report.records.len(),
            sentiment_slices => &report.sentiment_slices,
            emotion_slices => &report.emotion_slices,
        })
    }
}

/// The submitted URL, if it is safe to use as a link target
fn web_link(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}
