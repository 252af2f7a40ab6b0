use comms::{
    Vector,
    msg::{Command, Msg, Payload},
};
use tokio::io;

#[tokio::test]
async fn send_recv() -> io::Result<()> {
    const SIZE: usize = 128;

    let (one, two) = io::duplex(SIZE);
    let (rx, tx) = io::split(one);
    let (_, mut tx) = comms::channel(rx, tx);

    let (rx2, tx2) = io::split(two);
    let (mut rx, _) = comms::channel(rx2, tx2);

    let params = Vector::from(vec![0.5, -1.25, f64::INFINITY]);
    let msg = Msg::Data(Payload::Parameters(params.clone()));

    let sender = async move {
        tx.send(&msg).await?;
        tx.send(&Msg::Err("boom".into())).await?;
        tx.send(&Msg::Control(Command::Disconnect)).await
    };

    let receiver = async move {
        let mut buf = Vec::new();
        let got: Msg = rx.recv_into(&mut buf).await?;
        assert_eq!(got, Msg::Data(Payload::Parameters(params)));

        let got: Msg = rx.recv_into(&mut buf).await?;
        assert_eq!(got, Msg::Err("boom".into()));

        let got: Msg = rx.recv_into(&mut buf).await?;
        assert_eq!(got, Msg::Control(Command::Disconnect));
        Ok::<_, io::Error>(())
    };

    tokio::try_join!(sender, receiver)?;
    Ok(())
}

#[tokio::test]
async fn frames_larger_than_the_link_buffer() -> io::Result<()> {
    let (one, two) = io::duplex(64);
    let (rx, tx) = io::split(one);
    let (_, mut tx) = comms::channel(rx, tx);
    let (rx2, tx2) = io::split(two);
    let (mut rx, _) = comms::channel(rx2, tx2);

    let rows: Vec<Vector> = (0..100).map(|i| Vector::from(vec![i as f64; 7])).collect();
    let msg = Msg::Data(Payload::Partition(rows.clone()));

    let sender = async move { tx.send(&msg).await };
    let receiver = async move {
        let mut buf = Vec::new();
        let got: Msg = rx.recv_into(&mut buf).await?;
        assert_eq!(got, Msg::Data(Payload::Partition(rows)));
        Ok::<_, io::Error>(())
    };

    tokio::try_join!(sender, receiver)?;
    Ok(())
}

#[tokio::test]
async fn truncated_frame_is_an_error() {
    use tokio::io::AsyncWriteExt;

    let (mut one, two) = io::duplex(64);
    let (rx, tx) = io::split(two);
    let (mut rx, _) = comms::channel(rx, tx);

    // Announces 16 bytes, delivers 2 and hangs up.
    one.write_all(&16u64.to_be_bytes()).await.unwrap();
    one.write_all(&[0, 0]).await.unwrap();
    drop(one);

    let mut buf = Vec::new();
    let res: io::Result<Msg> = rx.recv_into(&mut buf).await;
    assert_eq!(res.unwrap_err().kind(), io::ErrorKind::UnexpectedEof);
}

#[tokio::test]
async fn oversized_frame_length_is_rejected_before_reading() {
    use tokio::io::AsyncWriteExt;

    let (mut one, two) = io::duplex(64);
    let (rx, tx) = io::split(two);
    let (mut rx, _) = comms::channel(rx, tx);

    one.write_all(&(u64::MAX / 2).to_be_bytes()).await.unwrap();

    let mut buf = Vec::new();
    let res: io::Result<Msg> = rx.recv_into(&mut buf).await;
    assert_eq!(res.unwrap_err().kind(), io::ErrorKind::InvalidData);
    assert!(buf.capacity() < comms::MAX_FRAME_LEN);

    // One byte over the limit is rejected as well.
    one.write_all(&(comms::MAX_FRAME_LEN as u64 + 1).to_be_bytes()).await.unwrap();
    let res: io::Result<Msg> = rx.recv_into(&mut buf).await;
    assert_eq!(res.unwrap_err().kind(), io::ErrorKind::InvalidData);
}
