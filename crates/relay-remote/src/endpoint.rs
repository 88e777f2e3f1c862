//! Slave endpoint resolution and path tokens.
//!
//! File paths travel inside a single URL path segment as URL-safe base64
//! without padding, so the slave can decode the exact original bytes no
//! matter which characters the path contains.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use relay_models::Policy;
use url::Url;

use crate::error::{RemoteError, RemoteResult};

/// Base path of upload callbacks on this site; the session key is appended.
pub const CALLBACK_PATH: &str = "/api/v3/callback/remote/";

/// Display name used when the caller does not supply one.
pub const DEFAULT_FILE_NAME: &str = "file";

/// Fixed slave API controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlaveEndpoint {
    Delete,
    Thumb,
    Download,
    Source,
    Upload,
}

impl SlaveEndpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlaveEndpoint::Delete => "delete",
            SlaveEndpoint::Thumb => "thumb",
            SlaveEndpoint::Download => "download",
            SlaveEndpoint::Source => "source",
            SlaveEndpoint::Upload => "upload",
        }
    }

    /// Absolute sub-path on the slave.
    pub fn path(&self) -> &'static str {
        match self {
            SlaveEndpoint::Delete => "/api/v3/slave/delete",
            SlaveEndpoint::Thumb => "/api/v3/slave/thumb",
            SlaveEndpoint::Download => "/api/v3/slave/download",
            SlaveEndpoint::Source => "/api/v3/slave/source",
            SlaveEndpoint::Upload => "/api/v3/slave/upload",
        }
    }

    /// Controller for file content, download or inline preview.
    pub fn for_source(is_download: bool) -> Self {
        if is_download {
            SlaveEndpoint::Download
        } else {
            SlaveEndpoint::Source
        }
    }

    /// Resolve this endpoint against the slave base address.
    pub fn resolve(&self, server: &Url) -> RemoteResult<Url> {
        join(server, self.path())
    }
}

/// Parse the policy's slave address.
pub fn parse_server(policy: &Policy) -> RemoteResult<Url> {
    Url::parse(&policy.server).map_err(|e| {
        RemoteError::config(format!("cannot parse slave address '{}': {}", policy.server, e))
    })
}

/// Encode a logical file path into a path-segment-safe token.
pub fn encode_path(path: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(path)
}

/// Recover the exact bytes of a path encoded by [`encode_path`].
pub fn decode_path(token: &str) -> RemoteResult<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|e| RemoteError::encoding(format!("invalid path token '{}': {}", token, e)))
}

/// `{controller}/{encoded}` for thumbnails.
pub fn thumb_path(encoded: &str) -> String {
    format!("{}/{}", SlaveEndpoint::Thumb.path(), encoded)
}

/// `{controller}/{speed}/{encoded}/{file_name}`.
///
/// The slave parses these fields positionally. The file name is
/// percent-encoded so it stays a single segment; names that would resolve
/// as dot segments fall back to [`DEFAULT_FILE_NAME`].
pub fn source_path(endpoint: SlaveEndpoint, speed: u64, encoded: &str, file_name: &str) -> String {
    let file_name = match file_name {
        "" | "." | ".." => DEFAULT_FILE_NAME,
        name => name,
    };
    format!(
        "{}/{}/{}/{}",
        endpoint.path(),
        speed,
        encoded,
        urlencoding::encode(file_name)
    )
}

/// Callback address for the upload session identified by `key`.
pub fn callback_url(site: &Url, key: &str) -> RemoteResult<Url> {
    join(site, &format!("{}{}", CALLBACK_PATH, urlencoding::encode(key)))
}

/// Resolve an absolute path against a base address.
pub fn join(base: &Url, path: &str) -> RemoteResult<Url> {
    base.join(path)
        .map_err(|e| RemoteError::config(format!("cannot resolve '{}' against '{}': {}", path, base, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> Url {
        Url::parse("http://slave.local:5212").unwrap()
    }

    #[test]
    fn test_endpoint_resolve() {
        assert_eq!(
            SlaveEndpoint::Delete.resolve(&server()).unwrap().as_str(),
            "http://slave.local:5212/api/v3/slave/delete"
        );
        assert_eq!(
            SlaveEndpoint::Upload.resolve(&server()).unwrap().path(),
            "/api/v3/slave/upload"
        );
    }

    #[test]
    fn test_resolve_ignores_server_path() {
        let server = Url::parse("http://slave.local/prefix/").unwrap();
        assert_eq!(
            SlaveEndpoint::Thumb.resolve(&server).unwrap().path(),
            "/api/v3/slave/thumb"
        );
    }

    #[test]
    fn test_encode_path_is_segment_safe() {
        let encoded = encode_path("/dir/a b/??.txt");
        assert!(!encoded.contains('/'));
        assert!(!encoded.contains('='));
        assert!(!encoded.contains('+'));
        assert_eq!(decode_path(&encoded).unwrap(), b"/dir/a b/??.txt");
    }

    #[test]
    fn test_decode_path_invalid() {
        assert!(matches!(decode_path("***"), Err(RemoteError::Encoding(_))));
    }

    #[test]
    fn test_source_path_field_order() {
        let download = source_path(SlaveEndpoint::Download, 128, "YWJj", "a.txt");
        let source = source_path(SlaveEndpoint::Source, 128, "YWJj", "a.txt");
        assert_eq!(download, "/api/v3/slave/download/128/YWJj/a.txt");
        assert_eq!(source, "/api/v3/slave/source/128/YWJj/a.txt");
    }

    #[test]
    fn test_source_path_escapes_file_name() {
        let path = source_path(SlaveEndpoint::Source, 0, "YWJj", "a/b?.txt");
        assert_eq!(path, "/api/v3/slave/source/0/YWJj/a%2Fb%3F.txt");
    }

    #[test]
    fn test_source_path_dot_names_use_default() {
        for name in ["", ".", ".."] {
            let relative = source_path(SlaveEndpoint::Source, 0, "YWJj", name);
            assert_eq!(relative, "/api/v3/slave/source/0/YWJj/file");

            let url = join(&server(), &relative).unwrap();
            let segments: Vec<_> = url.path_segments().unwrap().collect();
            assert_eq!(segments, vec!["api", "v3", "slave", "source", "0", "YWJj", "file"]);
        }
    }

    #[test]
    fn test_source_path_keeps_names_containing_dots() {
        let relative = source_path(SlaveEndpoint::Download, 0, "YWJj", "...");
        assert_eq!(relative, "/api/v3/slave/download/0/YWJj/...");
        let url = join(&server(), &relative).unwrap();
        assert_eq!(url.path_segments().unwrap().last(), Some("..."));
    }

    #[test]
    fn test_callback_url() {
        let site = Url::parse("https://site.example.com/").unwrap();
        assert_eq!(
            callback_url(&site, "abc123").unwrap().as_str(),
            "https://site.example.com/api/v3/callback/remote/abc123"
        );
    }

    #[test]
    fn test_parse_server_invalid() {
        let policy = Policy::new("not a url");
        assert!(matches!(parse_server(&policy), Err(RemoteError::Config(_))));
    }
}
