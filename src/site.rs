//! Supported source sites.
//!
//! The dev tracker aggregates posts from a fixed set of sites; each one has
//! its own icon and embed colour. The set is closed: a host that is not
//! listed here is an error, not a default.

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
    /// Spectrum and the RSI website.
    RobertsSpaceIndustries,
    Reddit,
}

/// Presentation metadata for one [`Site`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteProfile {
    pub icon_url: &'static str,
    /// Decimal RGB colour.
    pub color: u32,
}

impl Site {
    pub const ALL: [Site; 2] = [Site::RobertsSpaceIndustries, Site::Reddit];

    pub fn host(self) -> &'static str {
        match self {
            Site::RobertsSpaceIndustries => "robertsspaceindustries.com",
            Site::Reddit => "www.reddit.com",
        }
    }

    pub fn profile(self) -> SiteProfile {
        match self {
            Site::RobertsSpaceIndustries => SiteProfile {
                icon_url: "https://i33.servimg.com/u/f33/11/20/17/41/spectr10.png",
                color: 2674940,
            },
            Site::Reddit => SiteProfile {
                icon_url: "https://2.bp.blogspot.com/-r3brlD_9eHg/XDz5bERnBMI/AAAAAAAAG2Y/XfivK0eVkiQej2t-xfmlNL6MlSQZkvcEACK4BGAYYCw/s1600/logo%2Breddit.png",
                color: 16729344,
            },
        }
    }

    /// Exact host match, as found in entry links.
    pub fn from_host(host: &str) -> Result<Site> {
        Site::ALL
            .into_iter()
            .find(|site| site.host() == host)
            .ok_or_else(|| Error::UnknownSite(host.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_hosts_resolve() {
        assert_eq!(
            Site::from_host("robertsspaceindustries.com").unwrap(),
            Site::RobertsSpaceIndustries
        );
        assert_eq!(Site::from_host("www.reddit.com").unwrap(), Site::Reddit);
    }

    #[test]
    fn unknown_host_is_an_error() {
        let err = Site::from_host("old.reddit.com").unwrap_err();
        assert!(matches!(err, Error::UnknownSite(host) if host == "old.reddit.com"));
    }

    #[test]
    fn every_site_round_trips_through_its_host() {
        for site in Site::ALL {
            assert_eq!(Site::from_host(site.host()).unwrap(), site);
        }
    }

    #[test]
    fn profiles_carry_site_colours() {
        assert_eq!(Site::RobertsSpaceIndustries.profile().color, 2674940);
        assert_eq!(Site::Reddit.profile().color, 16729344);
    }
}
