//! Glue between parsed commands, the in-memory [`Model`] and persistence.

use anyhow::Context as _;
use perk_core::{
  model::{Model, Preferences},
  repository::MemberRepository,
};
use tracing::{info, warn};

use crate::command::{Command, CommandResult};

pub struct Logic<R> {
  model:      Model,
  repository: R,
}

impl<R: MemberRepository> Logic<R> {
  /// Build the model from whatever `repository` holds. A repository that has
  /// never been written to starts with an empty member list.
  pub fn load(repository: R, preferences: Preferences) -> anyhow::Result<Self> {
    let path = preferences.store_path.clone();
    let members = match repository
      .load()
      .with_context(|| format!("could not read data from {}", path.display()))?
    {
      Some(members) => members,
      None => {
        warn!(path = %path.display(), "no saved data, starting empty");
        Vec::new()
      }
    };

    let model = Model::new(members, preferences)
      .with_context(|| format!("data in {} is inconsistent", path.display()))?;
    Ok(Self { model, repository })
  }

  /// Run `command`, persisting the member list if it changed.
  pub fn execute(&mut self, command: Command) -> anyhow::Result<CommandResult> {
    info!(?command, "executing");
    let result = command.execute(&mut self.model)?;

    if result.mutated {
      self.repository.save(self.model.members()).with_context(|| {
        format!(
          "could not save data to {}",
          self.model.store_path().display()
        )
      })?;
    }
    Ok(result)
  }

  pub fn model(&self) -> &Model { &self.model }
}

#[cfg(test)]
mod tests {
  use std::cell::Cell;

  use perk_core::member::{Id, Member, Tier};
  use perk_store_sqlite::SqliteRepository;

  use super::*;

  fn add(name: &str) -> Command {
    Command::Add {
      name:    name.into(),
      phone:   None,
      email:   None,
      address: None,
      tier:    Tier::Silver,
    }
  }

  #[test]
  fn empty_repository_starts_empty() {
    let repo = SqliteRepository::open_in_memory().unwrap();
    let logic = Logic::load(repo, Preferences::default()).unwrap();
    assert_eq!(logic.model().number_of_members(), 0);
  }

  #[test]
  fn mutations_are_saved() {
    let repo = SqliteRepository::open_in_memory().unwrap();
    let mut logic = Logic::load(repo, Preferences::default()).unwrap();
    logic.execute(add("Ada")).unwrap();

    let saved = logic.repository.load().unwrap().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].id(), Id::new(1));
  }

  /// Counts saves and can be told to fail them.
  struct Recording {
    saves: Cell<usize>,
    fail:  bool,
  }

  #[derive(Debug, thiserror::Error)]
  #[error("disk full")]
  struct DiskFull;

  impl MemberRepository for Recording {
    type Error = DiskFull;

    fn load(&self) -> Result<Option<Vec<Member>>, DiskFull> { Ok(None) }

    fn save(&self, _members: &[Member]) -> Result<(), DiskFull> {
      if self.fail {
        return Err(DiskFull);
      }
      self.saves.set(self.saves.get() + 1);
      Ok(())
    }
  }

  #[test]
  fn reads_do_not_save() {
    let repo = Recording {
      saves: Cell::new(0),
      fail:  false,
    };
    let mut logic = Logic::load(repo, Preferences::default()).unwrap();
    logic.execute(add("Ada")).unwrap();
    logic.execute(Command::List { tier: None }).unwrap();
    logic.execute(Command::Stats { json: false }).unwrap();
    assert_eq!(logic.repository.saves.get(), 1);
  }

  #[test]
  fn save_failure_names_the_store_path() {
    let repo = Recording {
      saves: Cell::new(0),
      fail:  true,
    };
    let prefs = Preferences {
      store_path: "/tmp/perk-test.sqlite3".into(),
    };
    let mut logic = Logic::load(repo, prefs).unwrap();
    let err = logic.execute(add("Ada")).unwrap_err();
    assert_eq!(
      err.to_string(),
      "could not save data to /tmp/perk-test.sqlite3"
    );
  }
}
