//! [`SqliteRepository`] — the SQLite implementation of [`MemberRepository`].

use std::{collections::HashMap, path::Path};

use chrono::Utc;
use perk_core::{
  member::{Member, Reservation, Transaction},
  repository::MemberRepository,
};
use rusqlite::{Connection, OptionalExtension as _};
use tracing::info;

use crate::{
  Result,
  encode::{
    RawMember, RawReservation, RawTransaction, encode_amount, encode_dt,
    encode_id, encode_status, encode_tier, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Repository ──────────────────────────────────────────────────────────────

/// Member persistence backed by a single SQLite file.
pub struct SqliteRepository {
  conn: Connection,
}

impl SqliteRepository {
  /// Open (or create) a database at `path`, creating parent directories as
  /// needed, and run schema initialisation.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }
    Self::init(Connection::open(path)?)
  }

  /// Open an in-memory database — useful for testing.
  pub fn open_in_memory() -> Result<Self> {
    Self::init(Connection::open_in_memory()?)
  }

  fn init(conn: Connection) -> Result<Self> {
    conn.execute_batch(SCHEMA)?;
    Ok(Self { conn })
  }

  fn has_been_saved(&self) -> Result<bool> {
    let saved_at: Option<String> = self
      .conn
      .query_row(
        "SELECT value FROM meta WHERE key = 'saved_at'",
        [],
        |r| r.get(0),
      )
      .optional()?;
    Ok(saved_at.is_some())
  }

  fn load_transactions(&self) -> Result<HashMap<i64, Vec<Transaction>>> {
    let mut stmt = self
      .conn
      .prepare("SELECT transaction_id, member_id, amount, at FROM transactions")?;
    let raws = stmt
      .query_map([], |row| {
        Ok(RawTransaction {
          transaction_id: row.get(0)?,
          member_id:      row.get(1)?,
          amount:         row.get(2)?,
          at:             row.get(3)?,
        })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut by_member: HashMap<i64, Vec<Transaction>> = HashMap::new();
    for raw in raws {
      let member_id = raw.member_id;
      by_member
        .entry(member_id)
        .or_default()
        .push(raw.into_transaction()?);
    }
    Ok(by_member)
  }

  fn load_reservations(&self) -> Result<HashMap<i64, Vec<Reservation>>> {
    let mut stmt = self.conn.prepare(
      "SELECT reservation_id, member_id, at, status, remark FROM reservations",
    )?;
    let raws = stmt
      .query_map([], |row| {
        Ok(RawReservation {
          reservation_id: row.get(0)?,
          member_id:      row.get(1)?,
          at:             row.get(2)?,
          status:         row.get(3)?,
          remark:         row.get(4)?,
        })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut by_member: HashMap<i64, Vec<Reservation>> = HashMap::new();
    for raw in raws {
      let member_id = raw.member_id;
      by_member
        .entry(member_id)
        .or_default()
        .push(raw.into_reservation()?);
    }
    Ok(by_member)
  }
}

// ─── MemberRepository impl ───────────────────────────────────────────────────

impl MemberRepository for SqliteRepository {
  type Error = crate::Error;

  fn load(&self) -> Result<Option<Vec<Member>>> {
    if !self.has_been_saved()? {
      return Ok(None);
    }

    let mut transactions = self.load_transactions()?;
    let mut reservations = self.load_reservations()?;

    let mut stmt = self.conn.prepare(
      "SELECT member_id, name, phone, email, address, tier, registered_at
       FROM members ORDER BY position",
    )?;
    let raws = stmt
      .query_map([], |row| {
        Ok(RawMember {
          member_id:     row.get(0)?,
          name:          row.get(1)?,
          phone:         row.get(2)?,
          email:         row.get(3)?,
          address:       row.get(4)?,
          tier:          row.get(5)?,
          registered_at: row.get(6)?,
        })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    let members = raws
      .into_iter()
      .map(|raw| {
        let txns = transactions.remove(&raw.member_id).unwrap_or_default();
        let res = reservations.remove(&raw.member_id).unwrap_or_default();
        raw.into_member(txns, res)
      })
      .collect::<Result<Vec<_>>>()?;

    info!(count = members.len(), "loaded members");
    Ok(Some(members))
  }

  fn save(&self, members: &[Member]) -> Result<()> {
    let tx = self.conn.unchecked_transaction()?;

    tx.execute("DELETE FROM reservations", [])?;
    tx.execute("DELETE FROM transactions", [])?;
    tx.execute("DELETE FROM members", [])?;

    {
      let mut insert_member = tx.prepare(
        "INSERT INTO members (
           member_id, position, name, phone, email, address, tier, registered_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
      )?;
      let mut insert_txn = tx.prepare(
        "INSERT INTO transactions (transaction_id, member_id, amount, at)
         VALUES (?1, ?2, ?3, ?4)",
      )?;
      let mut insert_res = tx.prepare(
        "INSERT INTO reservations (reservation_id, member_id, at, status, remark)
         VALUES (?1, ?2, ?3, ?4, ?5)",
      )?;

      for (position, m) in members.iter().enumerate() {
        let member_id = encode_id(m.id());
        insert_member.execute(rusqlite::params![
          member_id,
          position as i64,
          m.name,
          m.phone,
          m.email,
          m.address,
          encode_tier(m.tier),
          encode_dt(m.registered_at),
        ])?;

        for t in m.transactions() {
          insert_txn.execute(rusqlite::params![
            encode_uuid(t.id().0),
            member_id,
            encode_amount(t.amount()),
            encode_dt(t.at()),
          ])?;
        }

        for r in m.reservations() {
          insert_res.execute(rusqlite::params![
            encode_uuid(r.id.0),
            member_id,
            encode_dt(r.at),
            encode_status(r.status),
            r.remark,
          ])?;
        }
      }
    }

    tx.execute(
      "INSERT INTO meta (key, value) VALUES ('saved_at', ?1)
       ON CONFLICT (key) DO UPDATE SET value = excluded.value",
      rusqlite::params![encode_dt(Utc::now())],
    )?;
    tx.commit()?;

    info!(count = members.len(), "saved members");
    Ok(())
  }
}
