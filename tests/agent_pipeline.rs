//! End-to-end pipeline tests: producer -> ring -> agent -> sink -> collector.

use std::net::UdpSocket;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use sensorlink::protocol::{HEADER_LEN, PROTOCOL_MAGIC, decode_event_frame};
use sensorlink::{
    CountingSink, ErrorKind, EventLevel, EventRecord, MessageType, ProtocolHeader, RingBuffer,
    Sink, TelemetryAgent, TelemetryConfig, UdpSink, decode_header, encode_header,
};

fn collector() -> Result<UdpSocket> {
    let socket = UdpSocket::bind("127.0.0.1:0")?;
    socket.set_read_timeout(Some(Duration::from_secs(5)))?;
    Ok(socket)
}

#[test]
fn events_reach_udp_collector_in_order() -> Result<()> {
    let collector = collector()?;
    let yaml = format!(
        "ring_capacity: 64\nagent:\n  max_drain_per_wake: 4\nsink:\n  endpoint: \"{}\"\n",
        collector.local_addr()?
    );
    let config = TelemetryConfig::parse(&yaml)?;

    let mut ring = RingBuffer::new(config.ring_capacity)?;
    let mut sink = UdpSink::new();
    sink.init(&config.sink)?;
    let (mut producer, consumer) = ring.split();

    let sent: Vec<EventRecord> = (0..20)
        .map(|id| EventRecord::new(id, EventLevel::Info, format!("reading {id}").as_bytes()))
        .collect::<sensorlink::Result<_>>()?;

    let stats = thread::scope(|scope| -> Result<_> {
        let agent = TelemetryAgent::start_with_config(scope, consumer, &mut sink, &config.agent)?;
        for event in &sent {
            assert!(producer.push(*event));
        }
        agent.notify();
        Ok(agent.stop())
    })?;
    assert_eq!(stats.sent, 20);
    assert_eq!(stats.send_failures, 0);

    let mut buf = [0u8; 2048];
    for (sequence, expected) in sent.iter().enumerate() {
        let len = collector.recv(&mut buf)?;
        let frame = decode_event_frame(&buf[..len])?;
        assert_eq!(frame.header.sequence_counter, sequence as u32);
        assert_eq!(frame.header.kind(), Some(MessageType::EventBatch));
        assert_eq!(frame.events.as_slice(), std::slice::from_ref(expected));
    }
    Ok(())
}

#[test]
fn overflow_is_dropped_and_counted_not_blocked() -> Result<()> {
    let mut ring = RingBuffer::new(8)?;
    let mut sink = CountingSink::recording();
    let (mut producer, consumer) = ring.split();

    // Fill before the agent exists so nothing drains concurrently.
    let accepted = (0..12u32)
        .filter(|&id| producer.push(EventRecord::with_timestamp(id, EventLevel::Debug, &[], 0).unwrap()))
        .count();
    assert_eq!(accepted, 8);
    assert_eq!(producer.dropped(), 4);

    thread::scope(|scope| -> Result<()> {
        let agent = TelemetryAgent::start(scope, consumer, &mut sink)?;
        agent.notify();
        assert_eq!(agent.stop().sent, 8);
        Ok(())
    })?;

    let ids: Vec<u32> = sink.events().iter().map(EventRecord::event_id).collect();
    assert_eq!(ids, (0..8).collect::<Vec<_>>());
    assert_eq!(ring.dropped(), 4);
    assert!(ring.is_empty());
    Ok(())
}

#[test]
fn repeated_bursts_share_one_agent() -> Result<()> {
    let mut ring = RingBuffer::new(16)?;
    let mut sink = CountingSink::new();
    let (mut producer, consumer) = ring.split();

    let stats = thread::scope(|scope| -> Result<_> {
        let agent = TelemetryAgent::start(scope, consumer, &mut sink)?;
        for burst in 0..10u32 {
            for i in 0..10 {
                let event = EventRecord::new(burst * 10 + i, EventLevel::Info, b"burst")?;
                while !producer.push(event) {
                    agent.notify();
                    thread::yield_now();
                }
            }
            agent.notify();
        }
        Ok(agent.stop())
    })?;

    assert_eq!(stats.sent, 100);
    assert!(stats.wakeups >= 10);
    assert_eq!(sink.count(), 100);
    Ok(())
}

#[test]
fn header_validation_through_public_api() -> Result<()> {
    let header = ProtocolHeader::new(MessageType::MetricsBatch, 9, 123, 0);
    let mut bytes = encode_header(&header)?;
    assert_eq!(decode_header(&bytes)?, header);
    assert_eq!(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]), PROTOCOL_MAGIC);

    bytes[0] ^= 0xFF;
    assert_eq!(decode_header(&bytes).unwrap_err().kind(), ErrorKind::ProtocolMagicMismatch);
    assert_eq!(decode_header(&bytes[..HEADER_LEN - 1]).unwrap_err().kind(), ErrorKind::ProtocolTruncated);
    Ok(())
}
