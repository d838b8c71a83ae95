//! # Worker
//!
//! Subscribes to the configured topic filter and persists every reading it can
//! extract. The MQTT event loop runs on the async runtime; Redis writes happen
//! on a blocking task that owns the connection and drains an mpsc queue.
//!
//! There is no delivery guarantee beyond the broker's: a message that fails to
//! parse or store is logged and dropped.

use anyhow::{Context, Result};
use bems_redis::{trim_before, write_readings, Reading};
use chrono::{TimeDelta, Utc};
use redis::Client;
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::spawn_blocking;
use tracing::{debug, error, info, warn};

use crate::config::WorkerConfig;
use crate::topics::parse_message;

/// Readings extracted from one MQTT message.
#[derive(Debug)]
pub struct Batch {
    pub topic: String,
    pub readings: Vec<Reading>,
}

pub async fn run(config: WorkerConfig) -> Result<()> {
    let client = Client::open(config.redis_url.as_str())
        .with_context(|| format!("invalid redis url {}", config.redis_url))?;
    let (tx, rx) = mpsc::channel::<Batch>(config.queue_capacity);
    let retention = config.retention;
    let storage = spawn_blocking(move || store_batches(client, rx, retention));

    let mut options = MqttOptions::new(&config.client_id, &config.mqtt_host, config.mqtt_port);
    options.set_keep_alive(Duration::from_secs(30));
    options.set_clean_session(true);
    let (mqtt, mut eventloop) = AsyncClient::new(options, 32);

    info!(host = %config.mqtt_host, port = config.mqtt_port, "connecting to MQTT broker");

    loop {
        tokio::select! {
            event = eventloop.poll() => match event {
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    // clean sessions forget subscriptions, so subscribe on every connect
                    mqtt.subscribe(config.topic.as_str(), QoS::AtLeastOnce)
                        .await
                        .context("failed to queue subscription")?;
                    info!(topic = %config.topic, "connected, subscribed");
                }
                Ok(Event::Incoming(Incoming::Publish(publish))) => {
                    if let Some(batch) = handle_publish(&publish.topic, &publish.payload) {
                        if tx.send(batch).await.is_err() {
                            error!("storage task stopped, shutting down");
                            break;
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    error!("MQTT eventloop error: {e}");
                    tokio::time::sleep(config.reconnect_delay).await;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                break;
            }
        }
    }

    drop(tx);
    storage.await.context("storage task panicked")?
}

/// Parses one message into a batch. `None` when there is nothing to store.
pub fn handle_publish(topic: &str, payload: &[u8]) -> Option<Batch> {
    match parse_message(topic, payload, Utc::now()) {
        Ok(readings) if readings.is_empty() => {
            debug!(topic, "no readings in message");
            None
        }
        Ok(readings) => Some(Batch {
            topic: topic.to_string(),
            readings,
        }),
        Err(e) => {
            warn!(topic, "dropping message: {e:#}");
            None
        }
    }
}

fn store_batches(client: Client, mut rx: mpsc::Receiver<Batch>, retention: Option<TimeDelta>) -> Result<()> {
    let mut con = client.get_connection().context("failed to connect to redis")?;
    info!("storage connected to redis");

    while let Some(batch) = rx.blocking_recv() {
        match write_readings(&mut con, &batch.readings) {
            Ok(saved) => info!(topic = %batch.topic, saved, "stored readings"),
            Err(e) => {
                error!(topic = %batch.topic, "failed to store readings: {e:#}");
                match client.get_connection() {
                    Ok(fresh) => con = fresh,
                    Err(e) => warn!("redis reconnect failed: {e}"),
                }
                continue;
            }
        }

        if let Some(retention) = retention {
            let cutoff = Utc::now() - retention;
            let channels: BTreeSet<_> = batch.readings.iter().map(|r| r.channel).collect();
            for channel in channels {
                if let Err(e) = trim_before(&mut con, channel, cutoff) {
                    warn!(%channel, "retention trim failed: {e:#}");
                }
            }
        }
    }

    info!("storage queue closed");
    Ok(())
}
