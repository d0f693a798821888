//! `SITE_GUIDANCE` synthesis (§4.3): a fixed set of site families, each
//! contributing a paragraph of prose warning about a known pitfall.

use url::Url;

struct SiteFamily {
    matches: fn(&str) -> bool,
    prose: &'static str,
}

const FAMILIES: &[SiteFamily] = &[
    SiteFamily {
        matches: |host| host.contains("activecommunities.com"),
        prose: "This is an ActiveCommunities-powered registration portal. These sites are React SPAs \
that render session data into DOM nodes after a client-side fetch; do not rely on querySelectorAll \
against the initial HTML. Prefer the site's own URL-parameter search API over DOM scraping.",
    },
    SiteFamily {
        matches: |host| host.starts_with("secure.") || host.starts_with("portal.") || host.starts_with("app."),
        prose: "This host looks like a hosted registration SPA (secure./portal./app. subdomain). Expect \
hydration delay after navigation; always wait for network idle and add an explicit post-load sleep \
before extracting.",
    },
    SiteFamily {
        matches: |host| host.contains("ticketleap") || host.contains("eventbrite") || host.contains("regpack"),
        prose: "This looks like a third-party ticketing/registration platform embed. Session data often \
lives behind a location or program id query parameter; inspect the URL structure for that parameter \
before writing selector logic.",
    },
];

/// Synthesize the `SITE_GUIDANCE` prose for a source URL.
pub fn site_guidance(source_url: &str) -> String {
    let Ok(url) = Url::parse(source_url) else {
        return String::new();
    };
    let host = url.host_str().unwrap_or_default().to_lowercase();

    FAMILIES
        .iter()
        .filter(|f| (f.matches)(&host))
        .map(|f| f.prose)
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_communities_gets_strong_warning() {
        let guidance = site_guidance("https://anc.apm.activecommunities.com/portlandparks/activity/search");
        assert!(guidance.contains("ActiveCommunities"));
    }

    #[test]
    fn unknown_host_gets_no_guidance() {
        let guidance = site_guidance("https://kidyoga.example/camps");
        assert!(guidance.is_empty());
    }

    #[test]
    fn secure_subdomain_gets_spa_warning() {
        let guidance = site_guidance("https://secure.campmanager.example/register");
        assert!(guidance.contains("hydration"));
    }
}
