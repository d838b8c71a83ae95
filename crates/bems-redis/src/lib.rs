//! # BEMS Redis
//!
//! This crate defines the reading record that is stored in Redis
//! and provides functions for writing readings and querying channel history.
//!
//! Layout:
//! - `bems:readings:<channel>` sorted set, scored by `recorded_at` in epoch millis
//! - `bems:latest:<channel>` last reading of the channel (plain JSON value)
//! - `bems:seq` counter giving every stored reading a unique id
use anyhow::{Context, Result};
use bems_core::{Channel, TimeWindow, TimedValue};
use chrono::{DateTime, Utc};
use redis::{Commands, Connection};
use serde::{Deserialize, Serialize};

// --- Data Structures ---

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct Reading {
    pub channel: Channel,
    pub value: f64,
    pub recorded_at: DateTime<Utc>,
}

impl Reading {
    pub fn new(channel: Channel, value: f64, recorded_at: DateTime<Utc>) -> Self {
        Self {
            channel,
            value,
            recorded_at,
        }
    }
}

impl TimedValue for Reading {
    fn timestamp(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    fn value(&self) -> f64 {
        self.value
    }
}

/// Sorted-set member. The id keeps two identical readings from collapsing
/// into one member.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Entry<R> {
    id: u64,
    reading: R,
}

// --- Key Builders ---

pub const SEQUENCE_KEY: &str = "bems:seq";

pub fn readings_key(channel: Channel) -> String {
    format!("bems:readings:{}", channel.key())
}

pub fn latest_key(channel: Channel) -> String {
    format!("bems:latest:{}", channel.key())
}

pub fn score(ts: DateTime<Utc>) -> f64 {
    ts.timestamp_millis() as f64
}

// --- Generic I/O Helpers ---

fn write_struct<T: Serialize>(con: &mut Connection, key: &str, value: &T) -> Result<()> {
    let json_string = serde_json::to_string(value)?;
    con.set::<_, _, ()>(key, json_string)?;
    Ok(())
}

fn read_optional_struct<T: for<'de> Deserialize<'de>>(
    con: &mut Connection,
    key: &str,
) -> Result<Option<T>> {
    let json_string: Option<String> = con.get(key)?;
    json_string
        .map(|s| serde_json::from_str(&s).with_context(|| format!("corrupt value at {key}")))
        .transpose()
}

fn decode_entries(members: Vec<String>) -> Result<Vec<Reading>> {
    members
        .iter()
        .map(|m| {
            let entry: Entry<Reading> =
                serde_json::from_str(m).with_context(|| format!("corrupt reading member: {m}"))?;
            Ok(entry.reading)
        })
        .collect()
}

// --- Read/Write Functions ---

/// Stores `reading` in its channel history and makes it the channel's latest
/// value. Returns the id assigned to it.
pub fn write_reading(con: &mut Connection, reading: &Reading) -> Result<u64> {
    let id: u64 = con.incr(SEQUENCE_KEY, 1)?;
    let member = serde_json::to_string(&Entry { id, reading })?;
    let _: () = con.zadd(readings_key(reading.channel), member, score(reading.recorded_at))?;
    write_struct(con, &latest_key(reading.channel), reading)?;
    Ok(id)
}

pub fn write_readings(con: &mut Connection, readings: &[Reading]) -> Result<usize> {
    for reading in readings {
        write_reading(con, reading)?;
    }
    Ok(readings.len())
}

/// Readings of `channel` recorded within `window` (inclusive), oldest first.
pub fn read_window(con: &mut Connection, channel: Channel, window: &TimeWindow) -> Result<Vec<Reading>> {
    let members: Vec<String> =
        con.zrangebyscore(readings_key(channel), score(window.start), score(window.end))?;
    decode_entries(members)
}

/// The last `limit` readings of `channel`, oldest first.
pub fn read_recent(con: &mut Connection, channel: Channel, limit: usize) -> Result<Vec<Reading>> {
    if limit == 0 {
        return Ok(Vec::new());
    }
    let stop = isize::try_from(limit).unwrap_or(isize::MAX) - 1;
    let members: Vec<String> = con.zrevrange(readings_key(channel), 0, stop)?;
    let mut readings = decode_entries(members)?;
    readings.reverse();
    Ok(readings)
}

pub fn read_latest(con: &mut Connection, channel: Channel) -> Result<Option<Reading>> {
    read_optional_struct(con, &latest_key(channel))
}

/// Drops readings of `channel` recorded strictly before `cutoff`.
/// Returns how many were removed.
pub fn trim_before(con: &mut Connection, channel: Channel, cutoff: DateTime<Utc>) -> Result<usize> {
    let removed: usize = con.zrembyscore(
        readings_key(channel),
        "-inf",
        format!("({}", score(cutoff)),
    )?;
    Ok(removed)
}
