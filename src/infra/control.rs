use crate::domain::ControlMessage;
use std::io::Write as _;
use std::net::{Ipv4Addr, SocketAddr, TcpListener as StdTcpListener, TcpStream as StdTcpStream};
use thiserror::Error;
use tokio::io::AsyncReadExt as _;
use tokio::net::TcpListener;
use tokio::sync::mpsc::UnboundedSender;

/// Fixed local control endpoint. Exclusive bind success on this port is
/// what makes "exactly one primary" hold.
pub const DEFAULT_CONTROL_PORT: u16 = 18838;

/// `TAPD_CONTROL_PORT` override, falling back to the fixed port on a
/// missing or unparseable value.
pub fn resolve_control_port() -> u16 {
    let Ok(raw) = std::env::var("TAPD_CONTROL_PORT") else {
        return DEFAULT_CONTROL_PORT;
    };
    match raw.parse::<u16>() {
        Ok(port) => port,
        Err(_) => {
            eprintln!("tapd: ignoring invalid TAPD_CONTROL_PORT: {raw}");
            DEFAULT_CONTROL_PORT
        }
    }
}

fn control_addr(port: u16) -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, port))
}

/// Outcome of the single-instance check. A `Primary` already holds the
/// bound listener so no second primary can slip in after the decision.
#[derive(Debug)]
pub enum Role {
    Primary(StdTcpListener),
    Secondary(StdTcpStream),
}

#[derive(Debug, Error)]
pub enum DetermineRoleError {
    #[error("failed to bind control port {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
}

/// A successful connect means another instance is serving, so this process
/// is a secondary. Connect refusal means nobody is listening; bind the
/// endpoint and become the primary. Bind failure is fatal to the caller.
pub fn determine_role(port: u16) -> Result<Role, DetermineRoleError> {
    let addr = control_addr(port);
    match StdTcpStream::connect(addr) {
        Ok(stream) => Ok(Role::Secondary(stream)),
        Err(_not_listening) => {
            let listener = StdTcpListener::bind(addr)
                .map_err(|source| DetermineRoleError::Bind { addr, source })?;
            Ok(Role::Primary(listener))
        }
    }
}

#[derive(Debug, Error)]
pub enum SendCommandError {
    #[error("failed to encode control message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to transmit control message: {0}")]
    Transmit(#[from] std::io::Error),
}

/// Secondary path: one JSON object over the already-open connection, then
/// the caller exits whether or not this worked.
pub fn send_command(stream: &mut StdTcpStream, command: &str) -> Result<(), SendCommandError> {
    let message = ControlMessage::new(command);
    let payload = serde_json::to_vec(&message)?;
    stream.write_all(&payload)?;
    stream.flush()?;
    Ok(())
}

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to register control listener with the runtime: {0}")]
    Register(std::io::Error),
}

/// Primary path: accept loop for the control protocol. Each connection is
/// decoded on its own task; every decoded message funnels through `tx`,
/// which is the single ordering point before the session loop. An accept
/// error stops only this loop, never the process.
pub async fn serve(
    listener: StdTcpListener,
    tx: UnboundedSender<ControlMessage>,
) -> Result<(), ServeError> {
    listener.set_nonblocking(true).map_err(ServeError::Register)?;
    let listener = TcpListener::from_std(listener).map_err(ServeError::Register)?;

    loop {
        let (stream, _peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(error) => {
                eprintln!("tapd: control listener stopped: {error}");
                return Ok(());
            }
        };
        let tx = tx.clone();
        tokio::spawn(async move {
            if let Err(error) = handle_connection(stream, tx).await {
                eprintln!("tapd: control connection dropped: {error}");
            }
        });
    }
}

#[derive(Debug, Error)]
enum HandleConnectionError {
    #[error("read failed: {0}")]
    Read(std::io::Error),

    #[error("malformed control message: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Exactly one message per connection: read to EOF, decode one object,
/// forward, close. Malformed payloads are logged by the caller and
/// forwarded nowhere.
async fn handle_connection(
    mut stream: tokio::net::TcpStream,
    tx: UnboundedSender<ControlMessage>,
) -> Result<(), HandleConnectionError> {
    let mut payload = Vec::new();
    stream
        .read_to_end(&mut payload)
        .await
        .map_err(HandleConnectionError::Read)?;
    let message: ControlMessage = serde_json::from_slice(&payload)?;
    // The session loop may already be gone during shutdown; nothing to do.
    let _ = tx.send(message);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tokio::sync::mpsc::unbounded_channel;

    fn free_port() -> u16 {
        let probe = StdTcpListener::bind((Ipv4Addr::LOCALHOST, 0)).expect("probe bind");
        probe.local_addr().expect("probe addr").port()
    }

    #[test]
    fn becomes_primary_when_nothing_is_listening() {
        let port = free_port();
        match determine_role(port).expect("role") {
            Role::Primary(listener) => {
                assert_eq!(listener.local_addr().expect("addr").port(), port);
            }
            Role::Secondary(_) => panic!("expected primary"),
        }
    }

    #[test]
    fn becomes_secondary_when_a_primary_holds_the_port() {
        let port = free_port();
        let Role::Primary(_listener) = determine_role(port).expect("first role") else {
            panic!("expected primary");
        };
        match determine_role(port).expect("second role") {
            Role::Secondary(_stream) => {}
            Role::Primary(_) => panic!("expected secondary"),
        }
    }

    #[tokio::test]
    async fn forwards_one_decoded_message_per_connection() {
        let port = free_port();
        let Role::Primary(listener) = determine_role(port).expect("role") else {
            panic!("expected primary");
        };
        let (tx, mut rx) = unbounded_channel();
        tokio::spawn(serve(listener, tx));

        let send = tokio::task::spawn_blocking(move || {
            let Role::Secondary(mut stream) = determine_role(port).expect("role") else {
                panic!("expected secondary");
            };
            send_command(&mut stream, "show").expect("send");
        });
        send.await.expect("send task");

        let message = rx.recv().await.expect("message");
        assert_eq!(message, ControlMessage::new("show"));
    }

    #[tokio::test]
    async fn malformed_payloads_are_dropped_without_stopping_the_listener() {
        let port = free_port();
        let Role::Primary(listener) = determine_role(port).expect("role") else {
            panic!("expected primary");
        };
        let (tx, mut rx) = unbounded_channel();
        tokio::spawn(serve(listener, tx));

        let send = tokio::task::spawn_blocking(move || {
            {
                let mut garbage = StdTcpStream::connect(control_addr(port)).expect("connect");
                garbage.write_all(b"not json").expect("write");
            }
            let Role::Secondary(mut stream) = determine_role(port).expect("role") else {
                panic!("expected secondary");
            };
            send_command(&mut stream, "kill").expect("send");
        });
        send.await.expect("send task");

        let message = rx.recv().await.expect("message");
        assert_eq!(message.command, "kill");
    }

    #[test]
    fn accepts_the_original_capitalized_field_name() {
        let message: ControlMessage =
            serde_json::from_str(r#"{"Command":"hide"}"#).expect("decode");
        assert_eq!(message.command, "hide");
        let encoded = serde_json::to_string(&ControlMessage::new("hide")).expect("encode");
        assert_eq!(encoded, r#"{"command":"hide"}"#);
    }
}
