//! Line-delimited stream transport
//!
//! Reads one JSON envelope per `\n`-terminated line and writes one response per
//! line. Lines are handled strictly in arrival order; a bad line is answered
//! with a parse error and never ends the stream.

use std::io;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::auth::RequestContext;
use crate::mcp::rpc::{json_rpc_parse_error, Response};
use crate::mcp::server::{handle_json_rpc_value, Dispatcher};

/// Why the stream transport stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamExit {
    EndOfInput,
    Interrupted,
}

/// Serves the process's stdin/stdout until end of input or Ctrl-C.
pub async fn run_stdio(dispatcher: &Dispatcher) -> io::Result<StreamExit> {
    let reader = BufReader::new(tokio::io::stdin());
    let writer = tokio::io::stdout();

    info!("stdio transport ready");
    tokio::select! {
        result = serve_stream(dispatcher, reader, writer) => {
            result?;
            info!("stdin closed, shutting down");
            Ok(StreamExit::EndOfInput)
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, shutting down");
            Ok(StreamExit::Interrupted)
        }
    }
}

pub async fn serve_stream<R, W>(dispatcher: &Dispatcher, mut reader: R, mut writer: W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let ctx = RequestContext::anonymous();
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            return Ok(());
        }

        let Some(response) = handle_line(dispatcher, &line, &ctx).await else {
            continue;
        };

        let mut encoded = serde_json::to_vec(&response)?;
        encoded.push(b'\n');
        writer.write_all(&encoded).await?;
        writer.flush().await?;
    }
}

async fn handle_line(dispatcher: &Dispatcher, raw: &[u8], ctx: &RequestContext) -> Option<Response> {
    let Ok(text) = std::str::from_utf8(raw) else {
        warn!(bytes = raw.len(), "received line that is not valid UTF-8");
        return Some(json_rpc_parse_error());
    };

    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    debug!(line = text, "recv");

    match serde_json::from_str::<Value>(text) {
        Ok(payload) => handle_json_rpc_value(dispatcher, payload, ctx).await,
        Err(err) => {
            warn!(error = %err, "received malformed JSON line");
            Some(json_rpc_parse_error())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerVariant;
    use crate::mcp::rpc::PARSE_ERROR;
    use crate::domain::{build_dispatcher, ProfileSettings};
    use serde_json::json;

    async fn run_lines(input: &[u8]) -> Vec<Value> {
        let dispatcher = build_dispatcher(ServerVariant::Full, ProfileSettings::default())
            .expect("dispatcher");
        let mut output = Vec::new();
        serve_stream(&dispatcher, input, &mut output)
            .await
            .expect("stream should end cleanly");

        String::from_utf8(output)
            .expect("utf-8 output")
            .lines()
            .map(|line| serde_json::from_str(line).expect("each output line is JSON"))
            .collect()
    }

    #[tokio::test]
    async fn bad_second_line_yields_parse_error_and_stream_continues() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"calculate","arguments":{"expression":"2 + 3 * 4"}}}"#,
            "\n",
            "{not json\n",
            r#"{"jsonrpc":"2.0","id":"three","method":"tools/list"}"#,
            "\n",
        );

        let responses = run_lines(input.as_bytes()).await;

        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[0]["result"]["content"][0]["text"], "2 + 3 * 4 = 14");
        assert_eq!(responses[1]["id"], Value::Null);
        assert_eq!(responses[1]["error"]["code"], PARSE_ERROR);
        assert_eq!(responses[2]["id"], "three");
        assert!(responses[2]["result"]["tools"].is_array());
    }

    #[tokio::test]
    async fn exactly_two_lines_in_two_lines_out() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            "{\"jsonrpc\":\"2.0\",\"id\":2,\n",
        );

        let responses = run_lines(input.as_bytes()).await;

        assert_eq!(responses.len(), 2);
        assert!(responses[0]["result"]["serverInfo"].is_object());
        assert_eq!(responses[1]["error"]["code"], PARSE_ERROR);
    }

    #[tokio::test]
    async fn invalid_utf8_is_a_parse_error() {
        let mut input = vec![0xff, 0xfe, b'\n'];
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":5,"method":"tools/list"}"#);

        let responses = run_lines(&input).await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["error"]["code"], PARSE_ERROR);
        assert_eq!(responses[1]["id"], 5);
    }

    #[tokio::test]
    async fn blank_lines_and_notifications_produce_no_output() {
        let input = concat!(
            "\n",
            "   \r\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":0,"method":"resources/list"}"#,
        );

        let responses = run_lines(input.as_bytes()).await;

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], 0);
        assert_eq!(
            responses[0],
            json!({"jsonrpc": "2.0", "id": 0, "result": responses[0]["result"].clone()})
        );
    }
}
