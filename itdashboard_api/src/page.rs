//! Per-request referer context.

/// The logical dashboard page a request emulates.
///
/// The upstream site expects a `Referer` matching the page a browser would
/// be on when the API call fires. Threading this as an explicit value keeps
/// the shared session free of per-request header mutation.
#[derive(Debug, Clone, Copy)]
pub enum Page<'a> {
    /// The government-wide dashboard (agency tiles).
    Govwide,
    /// A single agency's summary page.
    AgencySummary { code: &'a str },
    /// A single investment's business-case page.
    BusinessCase { code: &'a str, uii: &'a str },
}

impl Page<'_> {
    /// The referer URL this page context maps to, rooted at `home_url`.
    pub fn referer(&self, home_url: &str) -> String {
        match self {
            Page::Govwide => format!("{}/drupal/", home_url),
            Page::AgencySummary { code } => format!("{}/drupal/summary/{}", home_url, code),
            Page::BusinessCase { code, uii } => {
                format!("{}/drupal/summary/{}/{}", home_url, code, uii)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referer_per_page() {
        let home = "https://itdashboard.gov";
        assert_eq!(Page::Govwide.referer(home), "https://itdashboard.gov/drupal/");
        assert_eq!(
            Page::AgencySummary { code: "007" }.referer(home),
            "https://itdashboard.gov/drupal/summary/007"
        );
        assert_eq!(
            Page::BusinessCase { code: "007", uii: "007-000001" }.referer(home),
            "https://itdashboard.gov/drupal/summary/007/007-000001"
        );
    }
}
