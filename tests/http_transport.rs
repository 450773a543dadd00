use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use bedrock_proxy::providers::http::is_throttled;
use bedrock_proxy::{
  Error, GenerationRequest, HttpTransport, ModelTransport, RetryPolicy,
};

/// Serve one canned response per incoming connection, in order.
/// Returns the endpoint URL.
async fn serve(responses: Vec<String>) -> String
{   let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
      for response in responses
      {   let (mut socket, _) = listener.accept().await.unwrap();
          read_request(&mut socket).await;
          socket.write_all(response.as_bytes()).await.unwrap();
          socket.shutdown().await.unwrap();
      }
    });

    format!("http://{}/invoke", addr)
}

/// Consume headers and a Content-Length body
async fn read_request(socket: &mut tokio::net::TcpStream)
{   let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop
    {   let n = socket.read(&mut chunk).await.unwrap();
        if n == 0
        {   return;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf).to_string();
        if let Some(end) = text.find("\r\n\r\n")
        {   let content_length = text[..end]
              .lines()
              .filter_map(|l| l.split_once(':'))
              .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
              .and_then(|(_, v)| v.trim().parse::<usize>().ok())
              .unwrap_or(0);
            if buf.len() >= end + 4 + content_length
            {   return;
            }
        }
    }
}

fn http_response(status: &str, extra_headers: &str, body: &str) -> String
{   format!(
      "HTTP/1.1 {}\r\nContent-Type: application/json\r\n{}Content-Length: {}\r\nConnection: close\r\n\r\n{}",
      status, extra_headers, body.len(), body
    )
}

const TITAN_OK: &str = r#"{"inputTextTokenCount":4,"results":[{"tokenCount":2,"outputText":"Hi there","completionReason":"FINISH"}]}"#;

#[test]
fn test_is_throttled_classification()
{   let empty = HeaderMap::new();
    assert!(is_throttled(StatusCode::TOO_MANY_REQUESTS, &empty));
    assert!(!is_throttled(StatusCode::BAD_REQUEST, &empty));

    let mut headers = HeaderMap::new();
    headers.insert(
      "x-amzn-errortype",
      HeaderValue::from_static("ThrottlingException:http://internal.amazon.com/coral/")
    );
    assert!(is_throttled(StatusCode::BAD_REQUEST, &headers));
}

#[tokio::test]
async fn test_http_429_maps_to_rate_limited()
{   let url = serve(vec![
      http_response("429 Too Many Requests", "", "{}")
    ]).await;
    let transport = HttpTransport::new(url, None, Some(Duration::from_secs(5)))
      .unwrap();

    let result = transport.invoke(b"{}".to_vec()).await;

    assert_eq!(result, Err(Error::RateLimited));
}

#[tokio::test]
async fn test_http_server_error_is_api_error()
{   let url = serve(vec![
      http_response("500 Internal Server Error", "", r#"{"message":"boom"}"#)
    ]).await;
    let transport = HttpTransport::new(url, None, None).unwrap();

    let result = transport.invoke(b"{}".to_vec()).await;

    assert!(matches!(result, Err(Error::ApiError(msg)) if msg.contains("boom")));
}

#[tokio::test]
async fn test_invoker_over_http_retries_throttling()
{   let url = serve(vec![
      http_response("429 Too Many Requests", "", "{}"),
      http_response(
        "400 Bad Request",
        "x-amzn-ErrorType: ThrottlingException\r\n",
        "{}"
      ),
      http_response("200 OK", "", TITAN_OK),
    ]).await;
    let transport = HttpTransport::new(url, Some("token".to_string()), None)
      .unwrap();
    let invoker = bedrock_proxy::RetryingInvoker::new(
      transport,
      RetryPolicy::new(5, Duration::from_millis(10))
    );

    let response = invoker
      .invoke(&GenerationRequest::new("Say hi"))
      .await
      .unwrap();

    assert_eq!(response.text, "Hi there");
}
