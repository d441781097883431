//! クライアント側ルーティング

use std::fmt;

pub const DOCUMENTS: &str = "/documentsupload";
pub const VOICE_SCAN: &str = "/voicescan";
pub const USERS: &str = "/users";
pub const ORGANISATIONS: &str = "/organisations";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Documents,
    DocumentDetail(String),
    VoiceScan,
    Users(Option<String>),
    Organisations(Option<String>),
    NotFound,
}

impl Route {
    /// Parses a path; query string and trailing slashes are ignored. `/`
    /// lands on the document list.
    pub fn parse(path: &str) -> Route {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Route::Documents,
            ["documentsupload"] => Route::Documents,
            ["documentsupload", id] => Route::DocumentDetail(decode(id)),
            ["voicescan"] => Route::VoiceScan,
            ["users"] => Route::Users(None),
            ["users", id] => Route::Users(Some(decode(id))),
            ["organisations"] => Route::Organisations(None),
            ["organisations", id] => Route::Organisations(Some(decode(id))),
            _ => Route::NotFound,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Documents => DOCUMENTS.to_string(),
            Route::DocumentDetail(id) => format!("{DOCUMENTS}/{}", urlencoding::encode(id)),
            Route::VoiceScan => VOICE_SCAN.to_string(),
            Route::Users(None) => USERS.to_string(),
            Route::Users(Some(id)) => format!("{USERS}/{}", urlencoding::encode(id)),
            Route::Organisations(None) => ORGANISATIONS.to_string(),
            Route::Organisations(Some(id)) => format!("{ORGANISATIONS}/{}", urlencoding::encode(id)),
            Route::NotFound => "/".to_string(),
        }
    }
}

fn decode(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_routes() {
        assert_eq!(Route::parse("/"), Route::Documents);
        assert_eq!(Route::parse("/documentsupload/"), Route::Documents);
        assert_eq!(Route::parse("/documentsupload/42"), Route::DocumentDetail("42".into()));
        assert_eq!(Route::parse("/voicescan?x=1"), Route::VoiceScan);
        assert_eq!(Route::parse("/users/7"), Route::Users(Some("7".into())));
        assert_eq!(Route::parse("/organisations"), Route::Organisations(None));
        assert_eq!(Route::parse("/foo/bar/baz"), Route::NotFound);
    }

    #[test]
    fn test_path_round_trip() {
        for route in [
            Route::Documents,
            Route::DocumentDetail("a b".into()),
            Route::VoiceScan,
            Route::Users(Some("3".into())),
            Route::Organisations(None),
        ] {
            assert_eq!(Route::parse(&route.path()), route);
        }
    }
}
