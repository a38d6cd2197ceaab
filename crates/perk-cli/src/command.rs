//! Subcommands and their execution against the [`Model`].

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use clap::Subcommand;
use perk_core::{
  member::{Id, Member, Reservation, Tier, Transaction},
  model::Model,
  stats::Window,
};
use rust_decimal::Decimal;

/// What a command reports back, and whether it changed the member list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
  pub feedback: String,
  pub mutated:  bool,
}

impl CommandResult {
  fn read(feedback: impl Into<String>) -> Self {
    Self {
      feedback: feedback.into(),
      mutated:  false,
    }
  }

  fn write(feedback: impl Into<String>) -> Self {
    Self {
      feedback: feedback.into(),
      mutated:  true,
    }
  }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
  /// Register a new member.
  Add {
    name:    String,
    #[arg(long)]
    phone:   Option<String>,
    #[arg(long)]
    email:   Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long, default_value_t = Tier::Bronze)]
    tier:    Tier,
  },

  /// Change a member's profile. Omitted fields are left as they are.
  Edit {
    id:      Id,
    #[arg(long)]
    name:    Option<String>,
    #[arg(long)]
    phone:   Option<String>,
    #[arg(long)]
    email:   Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    tier:    Option<Tier>,
  },

  /// Remove a member and everything recorded against them.
  Delete { id: Id },

  /// Print one member with their transactions and reservations.
  Show { id: Id },

  /// List members, optionally only those of one tier.
  List {
    #[arg(long)]
    tier: Option<Tier>,
  },

  /// Record a purchase.
  Transact {
    id:     Id,
    #[arg(long)]
    amount: Decimal,
    /// When the purchase happened (RFC 3339); defaults to now.
    #[arg(long)]
    at:     Option<DateTime<Utc>>,
  },

  /// Book a reservation.
  Reserve {
    id:     Id,
    /// Reservation time (RFC 3339).
    #[arg(long)]
    at:     DateTime<Utc>,
    #[arg(long)]
    remark: Option<String>,
  },

  /// Member counts and transaction totals.
  Stats {
    /// Emit JSON instead of text.
    #[arg(long)]
    json: bool,
  },
}

impl Command {
  pub fn execute(self, model: &mut Model) -> anyhow::Result<CommandResult> {
    self.execute_at(model, Utc::now())
  }

  /// Execute with an explicit clock, used for defaults and statistics.
  pub fn execute_at(
    self,
    model: &mut Model,
    now: DateTime<Utc>,
  ) -> anyhow::Result<CommandResult> {
    match self {
      Command::Add {
        name,
        phone,
        email,
        address,
        tier,
      } => {
        let mut member = Member::new(model.next_id()?, name, tier, now);
        member.phone = phone;
        member.email = email;
        member.address = address;
        let line = describe(&member);
        model.add_member(member)?;
        Ok(CommandResult::write(format!("New member added: {line}")))
      }

      Command::Edit {
        id,
        name,
        phone,
        email,
        address,
        tier,
      } => {
        let target = model.member_by_id(id)?.clone();
        let mut edited = target.clone();
        if let Some(name) = name {
          edited.name = name;
        }
        if phone.is_some() {
          edited.phone = phone;
        }
        if email.is_some() {
          edited.email = email;
        }
        if address.is_some() {
          edited.address = address;
        }
        if let Some(tier) = tier {
          edited.tier = tier;
        }
        let line = describe(&edited);
        model.set_member(&target, edited)?;
        Ok(CommandResult::write(format!("Edited member: {line}")))
      }

      Command::Delete { id } => {
        let target = model.member_by_id(id)?.clone();
        let removed = model.delete_member(&target)?;
        Ok(CommandResult::write(format!(
          "Deleted member: {}",
          describe(&removed)
        )))
      }

      Command::Show { id } => {
        let member = model.member_by_id(id)?;
        Ok(CommandResult::read(detail(member)))
      }

      Command::List { tier } => {
        let listed: Vec<String> = model
          .members()
          .iter()
          .filter(|m| tier.is_none_or(|t| m.tier == t))
          .map(describe)
          .collect();
        let feedback = if listed.is_empty() {
          "No members to show.".to_owned()
        } else {
          listed.join("\n")
        };
        Ok(CommandResult::read(feedback))
      }

      Command::Transact { id, amount, at } => {
        let txn = Transaction::new(amount, at.unwrap_or(now))?;
        let member = model.add_transactions(id, [txn])?;
        Ok(CommandResult::write(format!(
          "Recorded {amount} for member {id}; lifetime spend {}",
          member.total_spent()
        )))
      }

      Command::Reserve { id, at, remark } => {
        let reservation = Reservation::new(at, remark);
        let rid = reservation.id;
        model.add_reservations(id, [reservation])?;
        Ok(CommandResult::write(format!(
          "Reserved {} for member {id} ({rid})",
          at.to_rfc3339()
        )))
      }

      Command::Stats { json } => {
        let summary = model.statistics_at(now).summary();
        if json {
          return Ok(CommandResult::read(serde_json::to_string_pretty(
            &summary,
          )?));
        }

        let mut out = format!("Members: {}\n", summary.total_members);
        for (tier, count) in &summary.members_by_tier {
          writeln!(out, "  {tier}: {count}")?;
        }
        for w in &summary.windows {
          writeln!(
            out,
            "Transactions ({}): {} totalling {}",
            window_label(w.window),
            w.transactions,
            w.amount
          )?;
        }
        Ok(CommandResult::read(out.trim_end().to_owned()))
      }
    }
  }
}

// ─── Rendering ────────────────────────────────────────────────────────────────

/// One-line summary of a member.
pub fn describe(m: &Member) -> String {
  let mut line = format!("#{} {} [{}]", m.id(), m.name, m.tier);
  if let Some(phone) = &m.phone {
    let _ = write!(line, " phone: {phone}");
  }
  if let Some(email) = &m.email {
    let _ = write!(line, " email: {email}");
  }
  if let Some(address) = &m.address {
    let _ = write!(line, " address: {address}");
  }
  line
}

/// Multi-line view of a member with their history.
fn detail(m: &Member) -> String {
  let mut out = describe(m);
  let _ = write!(
    out,
    "\nRegistered: {}\nLifetime spend: {}",
    m.registered_at.to_rfc3339(),
    m.total_spent()
  );

  let mut txns: Vec<&Transaction> = m.transactions().collect();
  txns.sort_by_key(|t| t.at());
  if !txns.is_empty() {
    out.push_str("\nTransactions:");
    for t in txns {
      let _ = write!(out, "\n  {} {}", t.at().to_rfc3339(), t.amount());
    }
  }

  let mut reservations: Vec<&Reservation> = m.reservations().collect();
  reservations.sort_by_key(|r| r.at);
  if !reservations.is_empty() {
    out.push_str("\nReservations:");
    for r in reservations {
      let _ = write!(out, "\n  {} {}", r.at.to_rfc3339(), r.status);
      if let Some(remark) = &r.remark {
        let _ = write!(out, " ({remark})");
      }
    }
  }
  out
}

/// Human-readable window name.
fn window_label(w: Window) -> &'static str {
  match w {
    Window::All => "all time",
    Window::PastMonth => "past month",
    Window::PastThreeMonths => "past 3 months",
    Window::PastSixMonths => "past 6 months",
  }
}
