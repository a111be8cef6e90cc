use async_trait::async_trait;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::{Note, NoteType, NotifyError, Transport, APPLICATION_NAME};
use crate::core::GrowlConfig;

const VERSION: &str = "GNTP/1.0";
const IO_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_RESPONSE: usize = 16 * 1024;

/// Origin headers identifying where a message came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginInfo {
    pub machine_name: String,
    pub software_name: String,
    pub software_version: String,
    pub platform_name: String,
    pub platform_version: String,
}

impl OriginInfo {
    pub fn detect() -> Self {
        OriginInfo {
            machine_name: sysinfo::System::host_name().unwrap_or_else(|| "unknown".to_string()),
            software_name: APPLICATION_NAME.to_string(),
            software_version: env!("CARGO_PKG_VERSION").to_string(),
            platform_name: sysinfo::System::name().unwrap_or_else(|| std::env::consts::OS.to_string()),
            platform_version: sysinfo::System::long_os_version().unwrap_or_default(),
        }
    }

    fn write_headers(&self, out: &mut String) {
        header(out, "Origin-Machine-Name", &self.machine_name);
        header(out, "Origin-Software-Name", &self.software_name);
        header(out, "Origin-Software-Version", &self.software_version);
        header(out, "Origin-Platform-Name", &self.platform_name);
        header(out, "Origin-Platform-Version", &self.platform_version);
    }
}

// Header values cannot carry CRLF
fn header(out: &mut String, name: &str, value: &str) {
    let value = value.replace("\r\n", "\n").replace('\r', "\n");
    out.push_str(name);
    out.push_str(": ");
    out.push_str(&value);
    out.push_str("\r\n");
}

fn bool_value(b: bool) -> &'static str {
    if b {
        "True"
    } else {
        "False"
    }
}

/// GNTP/1.0 client talking to a local or remote Growl daemon
#[derive(Debug, Clone)]
pub struct GntpTransport {
    host: String,
    port: u16,
    password: Option<String>,
    origin: OriginInfo,
}

impl GntpTransport {
    pub fn new(config: &GrowlConfig) -> Self {
        Self::with_origin(config, OriginInfo::detect())
    }

    pub fn with_origin(config: &GrowlConfig, origin: OriginInfo) -> Self {
        GntpTransport {
            host: config.host.clone(),
            port: config.port,
            password: config.password.clone(),
            origin,
        }
    }

    fn info_line(&self, action: &str) -> String {
        match &self.password {
            None => format!("{} {} NONE\r\n", VERSION, action),
            Some(password) => {
                let mut salt = [0u8; 16];
                rand::thread_rng().fill_bytes(&mut salt);
                format!(
                    "{} {} NONE {}\r\n",
                    VERSION,
                    action,
                    key_hash(password, &salt)
                )
            }
        }
    }

    pub fn register_message(&self) -> String {
        let mut out = self.info_line("REGISTER");
        header(&mut out, "Application-Name", APPLICATION_NAME);
        header(&mut out, "Notifications-Count", &NoteType::ALL.len().to_string());
        self.origin.write_headers(&mut out);
        out.push_str("\r\n");
        for note_type in NoteType::ALL {
            header(&mut out, "Notification-Name", note_type.as_str());
            header(&mut out, "Notification-Display-Name", note_type.as_str());
            header(&mut out, "Notification-Enabled", bool_value(true));
            out.push_str("\r\n");
        }
        out
    }

    pub fn notify_message(&self, note: &Note) -> String {
        let mut out = self.info_line("NOTIFY");
        header(&mut out, "Application-Name", APPLICATION_NAME);
        header(&mut out, "Notification-Name", note.note_type.as_str());
        header(&mut out, "Notification-Title", &note.title);
        header(&mut out, "Notification-Text", &note.description);
        header(&mut out, "Notification-Sticky", bool_value(note.sticky));
        header(
            &mut out,
            "Notification-Priority",
            &note.priority.as_gntp().to_string(),
        );
        if let Some(id) = &note.identifier {
            header(&mut out, "Notification-Coalescing-ID", id);
        }
        self.origin.write_headers(&mut out);
        out.push_str("\r\n");
        out
    }

    async fn send(&self, message: String) -> Result<(), NotifyError> {
        let addr = format!("{}:{}", self.host, self.port);
        tracing::debug!("Sending GNTP message to {}:\n{}", addr, message);

        let mut stream = tokio::time::timeout(IO_TIMEOUT, TcpStream::connect(addr.as_str()))
            .await
            .map_err(|_| NotifyError::Timeout)?
            .map_err(|source| NotifyError::Connect {
                addr: addr.clone(),
                source,
            })?;

        tokio::time::timeout(IO_TIMEOUT, stream.write_all(message.as_bytes()))
            .await
            .map_err(|_| NotifyError::Timeout)??;

        let response = tokio::time::timeout(IO_TIMEOUT, read_response(&mut stream))
            .await
            .map_err(|_| NotifyError::Timeout)??;
        parse_response(&response)
    }
}

#[async_trait]
impl Transport for GntpTransport {
    async fn register(&self) -> Result<(), NotifyError> {
        self.send(self.register_message()).await
    }

    async fn notify(&self, note: &Note) -> Result<(), NotifyError> {
        self.send(self.notify_message(note)).await
    }
}

/// `SHA256:<keyhash>.<salt>` where key = H(password + salt), keyhash = H(key)
pub fn key_hash(password: &str, salt: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt);
    let key = hasher.finalize();
    let key_hash = Sha256::digest(key);
    format!(
        "SHA256:{}.{}",
        hex::encode_upper(key_hash),
        hex::encode_upper(salt)
    )
}

async fn read_response(stream: &mut TcpStream) -> Result<String, NotifyError> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") || buf.len() > MAX_RESPONSE {
            break;
        }
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn parse_response(response: &str) -> Result<(), NotifyError> {
    let mut lines = response.lines();
    let status = lines
        .next()
        .ok_or_else(|| NotifyError::Protocol("empty response".to_string()))?;
    let mut parts = status.split_whitespace();

    if parts.next() != Some(VERSION) {
        return Err(NotifyError::Protocol(status.to_string()));
    }
    match parts.next() {
        Some("-OK") => Ok(()),
        Some("-ERROR") => {
            let mut code = String::new();
            let mut description = String::new();
            for line in lines {
                if let Some((name, value)) = line.split_once(':') {
                    match name.trim() {
                        "Error-Code" => code = value.trim().to_string(),
                        "Error-Description" => description = value.trim().to_string(),
                        _ => {}
                    }
                }
            }
            Err(NotifyError::Rejected { code, description })
        }
        _ => Err(NotifyError::Protocol(status.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Priority;

    fn transport(password: Option<&str>) -> GntpTransport {
        let config = GrowlConfig {
            password: password.map(str::to_string),
            ..GrowlConfig::default()
        };
        GntpTransport::with_origin(
            &config,
            OriginInfo {
                machine_name: "desk".to_string(),
                software_name: APPLICATION_NAME.to_string(),
                software_version: "0.1.0".to_string(),
                platform_name: "Darwin".to_string(),
                platform_version: "macOS 14.4".to_string(),
            },
        )
    }

    #[test]
    fn test_register_lists_both_note_types() {
        let msg = transport(None).register_message();

        assert!(msg.starts_with("GNTP/1.0 REGISTER NONE\r\n"));
        assert!(msg.contains("Notifications-Count: 2\r\n"));
        assert!(msg.contains("Notification-Name: Nag\r\n"));
        assert!(msg.contains("Notification-Name: Info\r\n"));
        assert!(msg.contains("Origin-Machine-Name: desk\r\n"));
        assert!(msg.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_notify_headers() {
        let note = Note {
            note_type: NoteType::Nag,
            title: "働け".to_string(),
            description: "[Write report] was 0:31:00 ago".to_string(),
            sticky: true,
            priority: Priority::Emergency,
            identifier: Some("hatarake.nag".to_string()),
        };
        let msg = transport(None).notify_message(&note);

        assert!(msg.contains("Notification-Name: Nag\r\n"));
        assert!(msg.contains("Notification-Title: 働け\r\n"));
        assert!(msg.contains("Notification-Sticky: True\r\n"));
        assert!(msg.contains("Notification-Priority: 2\r\n"));
        assert!(msg.contains("Notification-Coalescing-ID: hatarake.nag\r\n"));
        assert!(msg.contains("Origin-Platform-Name: Darwin\r\n"));
    }

    #[test]
    fn test_crlf_in_values_is_flattened() {
        let msg = transport(None).notify_message(&Note::info("a\r\nb", "c"));
        assert!(msg.contains("Notification-Title: a\nb\r\n"));
    }

    #[test]
    fn test_password_adds_key_hash() {
        let msg = transport(Some("hunter2")).register_message();
        let first = msg.lines().next().unwrap();
        assert!(first.starts_with("GNTP/1.0 REGISTER NONE SHA256:"));

        let hash = key_hash("hunter2", &[0u8; 4]);
        let (digest, salt) = hash.trim_start_matches("SHA256:").split_once('.').unwrap();
        assert_eq!(digest.len(), 64);
        assert_eq!(salt, "00000000");
        assert_eq!(hash, key_hash("hunter2", &[0u8; 4]));
        assert_ne!(hash, key_hash("hunter3", &[0u8; 4]));
    }

    #[test]
    fn test_parse_response() {
        assert!(parse_response("GNTP/1.0 -OK NONE\r\nResponse-Action: NOTIFY\r\n\r\n").is_ok());

        let err = parse_response(
            "GNTP/1.0 -ERROR NONE\r\nError-Code: 402\r\nError-Description: Not authorized\r\n\r\n",
        )
        .unwrap_err();
        match err {
            NotifyError::Rejected { code, description } => {
                assert_eq!(code, "402");
                assert_eq!(description, "Not authorized");
            }
            other => panic!("unexpected error {:?}", other),
        }

        assert!(matches!(parse_response(""), Err(NotifyError::Protocol(_))));
        assert!(matches!(
            parse_response("HTTP/1.1 200 OK\r\n"),
            Err(NotifyError::Protocol(_))
        ));
    }
}
