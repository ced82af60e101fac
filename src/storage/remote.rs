//! Upload-by-link downloads.
//!
//! Links come from users, so the outbound client only talks to public
//! addresses: literal IPs are checked before connecting, host names go through
//! a resolver that drops private answers, and redirects get the same checks.
//! Bodies are read chunk by chunk and abandoned as soon as they pass the cap.

use std::error::Error as StdError;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bytes::{Bytes, BytesMut};
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::redirect::Policy;
use url::{Host, Url};

use super::ObjectStoreError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_REDIRECTS: usize = 5;

/// A file downloaded from a user-supplied link
#[derive(Debug)]
pub struct RemoteFile {
    pub bytes: Bytes,
    pub file_name: String,
    pub content_type: Option<String>,
}

/// Client for [`fetch_remote`]: bounded in time and limited to public addresses
pub fn remote_client() -> anyhow::Result<reqwest::Client> {
    let redirects = Policy::custom(|attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else if !host_allowed(attempt.url()) {
            attempt.error("redirect to a non-public address")
        } else {
            attempt.follow()
        }
    });

    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(FETCH_TIMEOUT)
        .redirect(redirects)
        .dns_resolver(Arc::new(PublicResolver))
        .no_proxy()
        .build()
        .context("Failed to build outbound HTTP client")
}

/// Download `link` for re-upload. Only http and https links to public hosts
/// are followed; `http` should come from [`remote_client`].
pub async fn fetch_remote(
    http: &reqwest::Client,
    link: &str,
    max_bytes: usize,
) -> Result<RemoteFile, ObjectStoreError> {
    let fail = |reason: String| ObjectStoreError::Fetch {
        link: link.to_string(),
        reason,
    };

    let url = Url::parse(link.trim()).map_err(|e| fail(e.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(fail("only http and https links are supported".to_string()));
    }
    if !host_allowed(&url) {
        tracing::warn!(link = %link, "Refused link to a non-public address");
        return Err(fail("links to private addresses are not allowed".to_string()));
    }

    download(http, url, max_bytes).await.map_err(fail)
}

async fn download(http: &reqwest::Client, url: Url, max_bytes: usize) -> Result<RemoteFile, String> {
    let too_large = || format!("file is larger than {max_bytes} bytes");

    let file_name = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .unwrap_or("photo")
        .to_string();

    let mut response = http.get(url).send().await.map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("remote server answered {}", response.status()));
    }
    if response.content_length().is_some_and(|len| len > max_bytes as u64) {
        return Err(too_large());
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    // Content-Length may be absent or wrong, so the cap is enforced while reading
    let mut body = BytesMut::new();
    while let Some(chunk) = response.chunk().await.map_err(|e| e.to_string())? {
        if body.len() + chunk.len() > max_bytes {
            return Err(too_large());
        }
        body.extend_from_slice(&chunk);
    }

    Ok(RemoteFile {
        bytes: body.freeze(),
        file_name,
        content_type,
    })
}

/// Literal IP hosts must be public. Names are checked at resolution time.
fn host_allowed(url: &Url) -> bool {
    match url.host() {
        Some(Host::Ipv4(ip)) => is_public(IpAddr::V4(ip)),
        Some(Host::Ipv6(ip)) => is_public(IpAddr::V6(ip)),
        Some(Host::Domain(_)) => true,
        None => false,
    }
}

fn is_public(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_public_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_public_v4(v4),
            None => {
                let first = v6.segments()[0];
                !(v6.is_loopback()
                    || v6.is_unspecified()
                    || v6.is_multicast()
                    || (first & 0xfe00) == 0xfc00 // unique local
                    || (first & 0xffc0) == 0xfe80) // link local
            }
        },
    }
}

fn is_public_v4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    !(a == 0
        || ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_broadcast()
        || ip.is_documentation()
        || ip.is_multicast()
        || (a == 100 && (b & 0xc0) == 64)) // carrier-grade NAT
}

/// System resolver that discards loopback, private and link-local answers
struct PublicResolver;

impl Resolve for PublicResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(public_addrs(name.as_str().to_string()))
    }
}

async fn public_addrs(host: String) -> Result<Addrs, Box<dyn StdError + Send + Sync>> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host.as_str(), 0))
        .await?
        .filter(|addr| is_public(addr.ip()))
        .collect();
    if addrs.is_empty() {
        return Err(format!("{host} does not resolve to a public address").into());
    }
    Ok(Box::new(addrs.into_iter()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// One-shot HTTP server answering with a chunked body. When `finish` is
    /// false the body never ends and the connection is held open.
    async fn serve_chunks(chunks: Vec<Vec<u8>>, finish: bool) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 2048];
            let _ = socket.read(&mut request).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Type: image/jpeg\r\nTransfer-Encoding: chunked\r\n\r\n")
                .await
                .unwrap();
            for chunk in chunks {
                socket.write_all(format!("{:x}\r\n", chunk.len()).as_bytes()).await.unwrap();
                socket.write_all(&chunk).await.unwrap();
                socket.write_all(b"\r\n").await.unwrap();
            }
            if finish {
                socket.write_all(b"0\r\n\r\n").await.unwrap();
            } else {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
        });
        addr
    }

    #[tokio::test]
    async fn test_fetch_rejects_non_http_links() {
        let client = remote_client().unwrap();
        for link in ["ftp://example.com/a.jpg", "file:///etc/passwd", "not a url"] {
            let err = fetch_remote(&client, link, 1024).await.unwrap_err();
            assert!(matches!(err, ObjectStoreError::Fetch { .. }), "{link}");
        }
    }

    #[tokio::test]
    async fn test_fetch_rejects_private_addresses() {
        let client = remote_client().unwrap();
        for link in [
            "http://127.0.0.1:9/latest",
            "http://169.254.169.254/latest/meta-data/",
            "http://10.0.0.5/a.jpg",
            "http://[::1]/a.jpg",
            "http://[::ffff:127.0.0.1]/a.jpg",
            "http://0.0.0.0/a.jpg",
        ] {
            let err = fetch_remote(&client, link, 1024).await.unwrap_err();
            match err {
                ObjectStoreError::Fetch { reason, .. } => assert!(reason.contains("private"), "{link}: {reason}"),
                other => panic!("{link}: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_client_refuses_names_resolving_to_loopback() {
        let addr = serve_chunks(vec![b"secret".to_vec()], true).await;
        let client = remote_client().unwrap();
        let link = format!("http://localhost:{}/a.jpg", addr.port());
        let err = fetch_remote(&client, &link, 1024).await.unwrap_err();
        assert!(matches!(err, ObjectStoreError::Fetch { .. }));
    }

    #[tokio::test]
    async fn test_download_stops_at_the_cap() {
        let addr = serve_chunks(vec![vec![b'x'; 512], vec![b'x'; 4096]], false).await;
        let url = Url::parse(&format!("http://{addr}/big.jpg")).unwrap();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            download(&reqwest::Client::new(), url, 1024),
        )
        .await
        .expect("download should give up before the body ends");
        assert_eq!(result.unwrap_err(), "file is larger than 1024 bytes");
    }

    #[tokio::test]
    async fn test_download_collects_chunks() {
        let addr = serve_chunks(vec![b"ab".to_vec(), b"cd".to_vec()], true).await;
        let url = Url::parse(&format!("http://{addr}/pics/house.jpg")).unwrap();

        let file = download(&reqwest::Client::new(), url, 1024).await.unwrap();
        assert_eq!(file.bytes.as_ref(), b"abcd");
        assert_eq!(file.file_name, "house.jpg");
        assert_eq!(file.content_type.as_deref(), Some("image/jpeg"));
    }

    #[test]
    fn test_address_classes() {
        for ip in ["93.184.216.34", "8.8.8.8", "2606:4700::1111"] {
            assert!(is_public(ip.parse().unwrap()), "{ip}");
        }
        for ip in [
            "127.0.0.1",
            "10.1.2.3",
            "172.16.0.1",
            "192.168.1.1",
            "169.254.169.254",
            "100.64.0.1",
            "0.0.0.0",
            "::1",
            "::",
            "fd00::1",
            "fe80::1",
            "::ffff:10.0.0.1",
        ] {
            assert!(!is_public(ip.parse().unwrap()), "{ip}");
        }
    }
}
