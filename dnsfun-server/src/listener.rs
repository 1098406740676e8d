//! UDP listener: one task per datagram, answered by the router.

use std::net::SocketAddr;
use std::sync::Arc;

use dnsfun_core::Router;
use hickory_proto::op::Message;
use tokio::net::UdpSocket;
use tokio::sync::broadcast;

use crate::error::ServerError;

/// Receive buffer size; larger datagrams are truncated and fail to decode.
pub const MAX_DATAGRAM: usize = 4096;

/// Serve `socket` until `shutdown` fires.
pub async fn listen(
    socket: Arc<UdpSocket>,
    router: Arc<Router>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), ServerError> {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            received = socket.recv_from(&mut buf) => {
                let (len, peer) = match received {
                    Ok(received) => received,
                    Err(err) => {
                        tracing::warn!(error = %err, "udp receive failed");
                        continue;
                    }
                };
                let datagram = buf[..len].to_vec();
                let socket = socket.clone();
                let router = router.clone();
                tokio::spawn(async move {
                    let Some(response) = respond(&router, &datagram, peer) else {
                        return;
                    };
                    if let Err(err) = socket.send_to(&response, peer).await {
                        tracing::debug!(%peer, error = %err, "failed to send response");
                    }
                });
            }
        }
    }
    tracing::info!("udp listener stopped");
    Ok(())
}

/// Decode `datagram`, dispatch it and encode the reply. `None` means the
/// datagram is dropped without an answer.
pub fn respond(router: &Router, datagram: &[u8], peer: SocketAddr) -> Option<Vec<u8>> {
    let request = match Message::from_vec(datagram) {
        Ok(request) => request,
        Err(err) => {
            tracing::debug!(%peer, error = %err, "dropping undecodable datagram");
            return None;
        }
    };
    let response = router.dispatch(&request, peer);
    match response.to_vec() {
        Ok(bytes) => Some(bytes),
        Err(err) => {
            tracing::warn!(%peer, id = request.id(), error = %err, "failed to encode response");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnsfun_core::DefaultHandler;
    use hickory_proto::op::{MessageType, OpCode, Query, ResponseCode};
    use hickory_proto::rr::{Name, RecordType};

    fn router() -> Router {
        let mut router = Router::new();
        router
            .handle(Name::root(), Arc::new(DefaultHandler))
            .unwrap();
        router
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:53000".parse().unwrap()
    }

    #[test]
    fn garbage_is_dropped() {
        assert!(respond(&router(), b"\x01\x02", peer()).is_none());
    }

    #[test]
    fn query_gets_an_encoded_reply() {
        let mut request = Message::new();
        request
            .set_id(7)
            .set_message_type(MessageType::Query)
            .set_op_code(OpCode::Query)
            .add_query(Query::query(
                Name::from_ascii("foo.bogus.").unwrap(),
                RecordType::TXT,
            ));
        let bytes = respond(&router(), &request.to_vec().unwrap(), peer()).expect("reply");
        let reply = Message::from_vec(&bytes).unwrap();
        assert_eq!(reply.id(), 7);
        assert_eq!(reply.message_type(), MessageType::Response);
        assert_eq!(reply.response_code(), ResponseCode::NotImp);
    }
}
