// ── Request context ──
//
// What a classification / virtual-capability call knows about the
// requester: the identification string and the raw headers it came with.

use std::collections::HashMap;

/// Headers checked, in order, for the identification string. Proxies and
/// transcoders put the handset's own string in one of these.
const UA_HEADERS: &[&str] = &[
    "x-device-user-agent",
    "x-original-user-agent",
    "x-operamini-phone-ua",
    "x-skyfire-phone",
    "x-bolt-phone-ua",
    "device-stock-ua",
    "x-ucbrowser-device-ua",
    "user-agent",
];

/// A single classification request.
///
/// Header names are folded to lowercase with `_` replaced by `-`, and a
/// leading `http-` (CGI style) is stripped, so `HTTP_USER_AGENT` and
/// `User-Agent` address the same value.
#[derive(Debug, Clone, Default)]
pub struct Request {
    user_agent: String,
    user_agent_profile: Option<String>,
    xhtml_requester: bool,
    headers: HashMap<String, String>,
}

impl Request {
    /// Request carrying only an identification string.
    pub fn from_user_agent(user_agent: impl Into<String>) -> Self {
        let user_agent = user_agent.into();
        let mut headers = HashMap::new();
        headers.insert("user-agent".to_owned(), user_agent.clone());
        Self {
            user_agent,
            user_agent_profile: None,
            xhtml_requester: false,
            headers,
        }
    }

    /// Build a request from raw header pairs.
    pub fn from_headers<I, K, V>(headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let headers: HashMap<String, String> = headers
            .into_iter()
            .map(|(k, v)| (fold_header_name(k.as_ref()), v.into()))
            .collect();

        let user_agent = UA_HEADERS
            .iter()
            .find_map(|name| headers.get(*name))
            .cloned()
            .unwrap_or_default();

        let user_agent_profile = user_agent_profile(&headers);
        let xhtml_requester = headers.get("accept").is_some_and(|accept| {
            accept.contains("application/vnd.wap.xhtml+xml")
                || accept.contains("application/xhtml+xml")
        });

        Self {
            user_agent,
            user_agent_profile,
            xhtml_requester,
            headers,
        }
    }

    /// Attach a UA-profile URL, as a `X-Wap-Profile` header would.
    pub fn with_user_agent_profile(mut self, profile: impl Into<String>) -> Self {
        self.user_agent_profile = Some(profile.into());
        self
    }

    /// The identification string this request is classified by.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn user_agent_profile(&self) -> Option<&str> {
        self.user_agent_profile.as_deref()
    }

    pub fn is_xhtml_requester(&self) -> bool {
        self.xhtml_requester
    }

    /// Raw header value, looked up with the same folding as construction.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&fold_header_name(name)).map(String::as_str)
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(&fold_header_name(name))
    }

    /// The `User-Agent` header as sent, before any proxy substitution.
    pub fn original_user_agent(&self) -> &str {
        self.header("user-agent").unwrap_or(&self.user_agent)
    }
}

fn fold_header_name(name: &str) -> String {
    let folded = name.trim().to_ascii_lowercase().replace('_', "-");
    match folded.strip_prefix("http-") {
        Some(rest) => rest.to_owned(),
        None => folded,
    }
}

fn user_agent_profile(headers: &HashMap<String, String>) -> Option<String> {
    let direct = headers
        .get("x-wap-profile")
        .or_else(|| headers.get("profile"));

    // `Opt: "http://www.w3.org/1999/06/24-CCPPexchange"; ns=12` names a
    // companion `12-Profile` header carrying the actual URL.
    let via_opt = || {
        let opt = headers.get("opt")?;
        let ns = opt.split("ns=").nth(1)?;
        let ns: String = ns.chars().take_while(char::is_ascii_digit).collect();
        headers.get(&format!("{ns}-profile"))
    };

    direct
        .or_else(via_opt)
        .map(|raw| raw.trim().trim_matches('"').to_owned())
        .filter(|p| !p.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_header_wins_over_user_agent() {
        let req = Request::from_headers([
            ("User-Agent", "Opera/9.80 (J2ME/MIDP; Opera Mini/5.1)"),
            ("X-Device-User-Agent", "Nokia6300/2.0 (05.00) Profile/MIDP-2.0"),
        ]);
        assert_eq!(req.user_agent(), "Nokia6300/2.0 (05.00) Profile/MIDP-2.0");
        assert_eq!(
            req.original_user_agent(),
            "Opera/9.80 (J2ME/MIDP; Opera Mini/5.1)"
        );
    }

    #[test]
    fn cgi_style_header_names_are_folded() {
        let req = Request::from_headers([("HTTP_USER_AGENT", "SAGEM-my-X5/1.0")]);
        assert_eq!(req.user_agent(), "SAGEM-my-X5/1.0");
        assert_eq!(req.header("User-Agent"), Some("SAGEM-my-X5/1.0"));
        assert!(req.has_header("HTTP_USER_AGENT"));
    }

    #[test]
    fn missing_user_agent_is_empty() {
        let req = Request::from_headers([("Accept", "text/html")]);
        assert_eq!(req.user_agent(), "");
        assert!(!req.is_xhtml_requester());
    }

    #[test]
    fn wap_profile_is_unquoted() {
        let req = Request::from_headers([
            ("User-Agent", "SAGEM-myX-6/1.0"),
            ("X-Wap-Profile", "\"http://example.com/sagem.xml\""),
        ]);
        assert_eq!(req.user_agent_profile(), Some("http://example.com/sagem.xml"));
    }

    #[test]
    fn opt_header_points_at_numbered_profile() {
        let req = Request::from_headers([
            ("User-Agent", "Foo/1.0"),
            ("Opt", "\"http://www.w3.org/1999/06/24-CCPPexchange\"; ns=12"),
            ("12-Profile", "http://example.com/foo.xml"),
        ]);
        assert_eq!(req.user_agent_profile(), Some("http://example.com/foo.xml"));
    }

    #[test]
    fn xhtml_accept_marks_requester() {
        let req = Request::from_headers([
            ("User-Agent", "Foo/1.0"),
            ("Accept", "application/vnd.wap.xhtml+xml, */*"),
        ]);
        assert!(req.is_xhtml_requester());
    }
}
