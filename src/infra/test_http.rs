// One-shot HTTP server for exercising the Google clients against canned answers.

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Answers exactly one request with `status` and a JSON `body`.
///
/// Returns `http://127.0.0.1:<port>` and a handle yielding the request line
/// and body that were received.
pub async fn serve_once(status: &str, body: &str) -> (String, JoinHandle<(String, String)>) {
    let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let (read_half, mut write_half) = stream.split();
        let mut reader = BufReader::new(read_half);

        let mut request_line = String::new();
        reader.read_line(&mut request_line).await.unwrap();

        let mut content_length = 0;
        loop {
            let mut header = String::new();
            let read = reader.read_line(&mut header).await.unwrap();
            if read == 0 || header.trim_end().is_empty() {
                break;
            }
            if let Some((name, value)) = header.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap();
                }
            }
        }

        let mut request_body = vec![0; content_length];
        reader.read_exact(&mut request_body).await.unwrap();

        write_half.write_all(response.as_bytes()).await.unwrap();
        write_half.flush().await.unwrap();

        (
            request_line.trim_end().to_string(),
            String::from_utf8(request_body).unwrap(),
        )
    });

    (base_url, handle)
}
