//! End-to-end sessions over loopback UDP, including a raw-socket peer that
//! speaks the wire format directly to pin down observable protocol behavior.

use slipwire::consts::{ACK_FRAME_LEN, DATA_FRAME_LEN, PAYLOAD_MAX};
use slipwire::endpoint::{Endpoint, LossyEndpoint, UdpEndpoint};
use slipwire::error::SessionError;
use slipwire::protocol::{AckFrame, DataFrame};
use slipwire::{ReceiveSession, SendSession};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;

fn pattern_byte(index: usize) -> u8 {
    b'A' + (index % 26) as u8
}

fn loopback(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

async fn run_transfer(
    sender: SendSession<impl Endpoint>,
    mut receiver: ReceiveSession<impl Endpoint>,
    count: usize,
) {
    let producer = tokio::spawn(async move {
        for i in 0..count {
            let payload = vec![pattern_byte(i); PAYLOAD_MAX];
            sender.submit(&payload).await;
        }
        sender.flush().await;
    });

    let mut buf = [0u8; PAYLOAD_MAX];
    for i in 0..count {
        let len = receiver.recv(&mut buf).await;
        assert_eq!(len, PAYLOAD_MAX, "frame {i} length");
        assert!(
            buf[..len].iter().all(|&b| b == pattern_byte(i)),
            "frame {i} content"
        );
    }

    producer.await.expect("producer task");
}

#[tokio::test]
async fn lossless_transfer_delivers_everything_in_order() {
    let receiver = ReceiveSession::bind(0, 32).await.unwrap();
    let port = receiver.local_addr().unwrap().port();
    let sender = SendSession::connect("127.0.0.1", port, 32).await.unwrap();

    timeout(Duration::from_secs(60), run_transfer(sender, receiver, 1024))
        .await
        .expect("transfer stalled");
}

#[tokio::test]
async fn transfer_survives_loss_in_both_directions() {
    let receiver = ReceiveSession::with_endpoint(
        LossyEndpoint::seeded(UdpEndpoint::bind(0).await.unwrap(), 0.05, 11),
        16,
    )
    .unwrap();
    let port = receiver.local_addr().unwrap().port();
    let sender = SendSession::with_endpoint(
        LossyEndpoint::seeded(UdpEndpoint::ephemeral().await.unwrap(), 0.05, 13),
        loopback(port),
        16,
    )
    .unwrap();

    timeout(Duration::from_secs(120), run_transfer(sender, receiver, 256))
        .await
        .expect("transfer stalled");
}

#[tokio::test]
async fn out_of_order_arrivals_are_reordered_and_acked_cumulatively() {
    let mut receiver = ReceiveSession::bind(0, 4).await.unwrap();
    let port = receiver.local_addr().unwrap().port();
    let wire = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    let mut acks = Vec::new();
    for seq in [3u8, 1, 2, 4] {
        let frame = DataFrame::new(seq, format!("payload {seq}").into_bytes().into()).encode();
        wire.send_to(&frame, loopback(port)).await.unwrap();

        let mut buf = [0u8; ACK_FRAME_LEN];
        let (len, _) = timeout(Duration::from_secs(2), wire.recv_from(&mut buf))
            .await
            .expect("ack missing")
            .unwrap();
        acks.push(AckFrame::decode(&buf[..len]).unwrap().ack);
    }
    assert_eq!(acks, vec![0, 1, 3, 4]);

    let mut buf = [0u8; PAYLOAD_MAX];
    for seq in 1u8..=4 {
        let len = receiver.recv(&mut buf).await;
        assert_eq!(&buf[..len], format!("payload {seq}").as_bytes());
    }
}

#[tokio::test]
async fn lost_ack_is_covered_by_retransmission() {
    let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = peer.local_addr().unwrap().port();
    let sender = SendSession::connect("127.0.0.1", port, 4).await.unwrap();

    sender.submit(b"only frame").await;

    // first transmission arrives; the peer withholds its ACK
    let mut first = [0u8; DATA_FRAME_LEN];
    let (len, from) = timeout(Duration::from_secs(2), peer.recv_from(&mut first))
        .await
        .expect("initial send missing")
        .unwrap();
    let frame = DataFrame::decode(&first[..len]).unwrap();
    assert_eq!(frame.seq(), 1);
    assert_eq!(frame.payload().as_ref(), b"only frame");

    // one RTO later the identical bytes come around again
    let mut second = [0u8; DATA_FRAME_LEN];
    let (len, _) = timeout(Duration::from_secs(2), peer.recv_from(&mut second))
        .await
        .expect("retransmission missing")
        .unwrap();
    assert_eq!(&second[..len], &first[..]);

    // releasing the ACK drains the window
    peer.send_to(&AckFrame { ack: 1 }.encode(), from)
        .await
        .unwrap();
    timeout(Duration::from_secs(2), sender.flush())
        .await
        .expect("flush stalled");
}

#[tokio::test]
async fn full_window_blocks_submit_until_a_slot_frees() {
    let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = peer.local_addr().unwrap().port();
    let sender = SendSession::connect("127.0.0.1", port, 4).await.unwrap();

    for i in 0u8..4 {
        sender.submit(&[i]).await;
    }
    let mut buf = [0u8; DATA_FRAME_LEN];
    let mut from = None;
    for _ in 0..4 {
        let (_, addr) = peer.recv_from(&mut buf).await.unwrap();
        from = Some(addr);
    }

    // the fifth submit parks on the exhausted window
    let fifth = sender.submit(b"fifth");
    tokio::pin!(fifth);
    assert!(
        timeout(Duration::from_millis(300), fifth.as_mut())
            .await
            .is_err(),
        "submit returned with a full window"
    );

    // one cumulative ACK frees exactly one slot
    peer.send_to(&AckFrame { ack: 1 }.encode(), from.unwrap())
        .await
        .unwrap();
    timeout(Duration::from_secs(2), fifth)
        .await
        .expect("submit still blocked after a slot freed");

    let sixth = sender.submit(b"sixth");
    tokio::pin!(sixth);
    assert!(
        timeout(Duration::from_millis(300), sixth.as_mut())
            .await
            .is_err(),
        "a single ACK freed more than one slot"
    );
}

#[tokio::test]
async fn window_sizes_are_validated_at_init() {
    for bad in [0usize, 129, 4096] {
        assert!(matches!(
            SendSession::connect("127.0.0.1", 9, bad).await,
            Err(SessionError::BadWindowSize(_))
        ));
        assert!(matches!(
            ReceiveSession::bind(0, bad).await,
            Err(SessionError::BadWindowSize(_))
        ));
    }
}
