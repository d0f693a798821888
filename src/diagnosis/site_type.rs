//! Site-type classification used by the diagnosis stage (§4.6). Distinct
//! from [`crate::prompt::site_guidance`], which contributes prose to the
//! prompt; this is a closed label consumed by the feedback rules below.

use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteType {
    ActiveCommunities,
    ReactSpa,
    Unknown,
}

pub fn classify_site(url: &str) -> SiteType {
    let Ok(parsed) = Url::parse(url) else {
        return SiteType::Unknown;
    };
    let host = parsed.host_str().unwrap_or_default().to_lowercase();

    if host.contains("activecommunities.com") {
        SiteType::ActiveCommunities
    } else if host.starts_with("secure.") || host.starts_with("portal.") || host.starts_with("app.") {
        SiteType::ReactSpa
    } else {
        SiteType::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_active_communities() {
        assert_eq!(
            classify_site("https://anc.apm.activecommunities.com/portlandparks/search"),
            SiteType::ActiveCommunities
        );
    }

    #[test]
    fn recognizes_hosted_spa_subdomains() {
        assert_eq!(classify_site("https://secure.campmanager.example/x"), SiteType::ReactSpa);
        assert_eq!(classify_site("https://portal.example.com/x"), SiteType::ReactSpa);
        assert_eq!(classify_site("https://app.example.com/x"), SiteType::ReactSpa);
    }

    #[test]
    fn falls_back_to_unknown() {
        assert_eq!(classify_site("https://kidyoga.example/camps"), SiteType::Unknown);
        assert_eq!(classify_site("not a url"), SiteType::Unknown);
    }
}
