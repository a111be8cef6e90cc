use std::net::SocketAddr;
use std::time::Duration;

use hatarake::core::{GrowlConfig, Priority};
use hatarake::notify::{GntpTransport, Growler, Note, NoteType, NotifyError, OriginInfo, Transport};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Fake growl daemon: records each request and answers with `reply`
async fn fake_growl(reply: &'static str) -> (SocketAddr, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            // requests have no length prefix; stop once the client goes quiet
            while let Ok(Ok(n)) =
                tokio::time::timeout(Duration::from_millis(200), socket.read(&mut chunk)).await
            {
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
            }
            let _ = tx.send(String::from_utf8_lossy(&request).into_owned());
            let _ = socket.write_all(reply.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    (addr, rx)
}

fn transport(addr: SocketAddr, password: Option<&str>) -> GntpTransport {
    GntpTransport::with_origin(
        &GrowlConfig {
            host: addr.ip().to_string(),
            port: addr.port(),
            password: password.map(str::to_string),
        },
        OriginInfo {
            machine_name: "desk".to_string(),
            software_name: "Hatarake".to_string(),
            software_version: "0.1.0".to_string(),
            platform_name: "Darwin".to_string(),
            platform_version: "macOS 14.4".to_string(),
        },
    )
}

const OK: &str = "GNTP/1.0 -OK NONE\r\nResponse-Action: NOTIFY\r\n\r\n";
const DENIED: &str =
    "GNTP/1.0 -ERROR NONE\r\nError-Code: 400\r\nError-Description: Not authorized\r\n\r\n";

#[tokio::test]
async fn test_register_and_nag_round_trip() {
    let (addr, mut requests) = fake_growl(OK).await;
    let growler = Growler::new(transport(addr, None)).await;

    let register = requests.recv().await.unwrap();
    assert!(register.starts_with("GNTP/1.0 REGISTER NONE\r\n"));
    assert!(register.contains("Application-Name: Hatarake\r\n"));

    growler.nag("Write report", chrono::Duration::minutes(31)).await;
    let notify = requests.recv().await.unwrap();
    assert!(notify.starts_with("GNTP/1.0 NOTIFY NONE\r\n"));
    assert!(notify.contains("Notification-Name: Nag\r\n"));
    assert!(notify.contains("Notification-Text: [Write report] was 0:31:00 ago\r\n"));
    assert!(notify.contains("Notification-Priority: 2\r\n"));
    assert!(notify.contains("Origin-Software-Name: Hatarake\r\n"));
}

#[tokio::test]
async fn test_password_is_hashed_on_the_wire() {
    let (addr, mut requests) = fake_growl(OK).await;
    transport(addr, Some("hunter2"))
        .notify(&Note::info("Pause", "Unpaused Alerts"))
        .await
        .unwrap();

    let request = requests.recv().await.unwrap();
    assert!(request.starts_with("GNTP/1.0 NOTIFY NONE SHA256:"));
    assert!(!request.contains("hunter2"));
}

#[tokio::test]
async fn test_error_response_is_reported_by_transport() {
    let (addr, _requests) = fake_growl(DENIED).await;
    let err = transport(addr, None)
        .notify(&Note::info("t", "m"))
        .await
        .unwrap_err();

    match err {
        NotifyError::Rejected { code, .. } => assert_eq!(code, "400"),
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_growler_swallows_unreachable_server() {
    // grab a free port, then close it so nothing is listening
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let growler = Growler::new(transport(addr, None)).await;
    growler.info("Pause", "Pausing alerts").await;

    let err = growler
        .transport()
        .notify(&Note {
            note_type: NoteType::Nag,
            title: "x".to_string(),
            description: "y".to_string(),
            sticky: true,
            priority: Priority::High,
            identifier: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, NotifyError::Connect { .. }));
}
