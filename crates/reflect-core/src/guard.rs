//! Access control in front of every entry mutation and read.

use tracing::debug;
use uuid::Uuid;

use crate::{
  Error, Result,
  directory::{ClassroomDirectory, Identity, Role},
  entry::ReflectionEntry,
};

/// How a viewer is entitled to see an entry or classroom listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
  Author,
  Member,
  Teacher,
}

impl Access {
  /// Whether anonymity is lifted for this viewer.
  pub fn reveals_author(self) -> bool { matches!(self, Self::Author | Self::Teacher) }
}

/// Authorship-only operations: edits, visibility, delete, feedback request.
pub fn require_author(actor: &Identity, entry: &ReflectionEntry) -> Result<()> {
  if entry.is_author(actor.user_id) {
    Ok(())
  } else {
    debug!(user = %actor.user_id, entry = %entry.entry_id, "non-author mutation rejected");
    Err(Error::forbidden("only the author may change this entry"))
  }
}

/// Membership and role checks backed by a [`ClassroomDirectory`].
pub struct Guard<'a, D> {
  directory: &'a D,
}

impl<'a, D> Guard<'a, D>
where
  D: ClassroomDirectory,
{
  pub fn new(directory: &'a D) -> Self { Self { directory } }

  /// Viewing and liking: the author always, otherwise a member or teacher of
  /// the classroom the entry is published into.
  pub async fn require_viewer(
    &self,
    actor: &Identity,
    entry: &ReflectionEntry,
  ) -> Result<Access> {
    if entry.is_author(actor.user_id) {
      return Ok(Access::Author);
    }
    let Some(classroom_id) = entry.visibility.classroom_id() else {
      return Err(Error::forbidden("entry is private"));
    };
    self.classroom_access(actor, classroom_id).await?.ok_or_else(|| {
      debug!(user = %actor.user_id, classroom = %classroom_id, "viewer not enrolled");
      Error::forbidden("not a member of the entry's classroom")
    })
  }

  /// Reading a classroom's public listing.
  pub async fn require_classroom_reader(
    &self,
    actor: &Identity,
    classroom_id: Uuid,
  ) -> Result<Access> {
    if !self.directory.classroom_exists(classroom_id).await? {
      return Err(Error::ClassroomNotFound(classroom_id));
    }
    self
      .classroom_access(actor, classroom_id)
      .await?
      .ok_or_else(|| Error::forbidden("not a member of this classroom"))
  }

  /// Feedback fulfillment: a teacher who teaches `classroom_id`.
  pub async fn require_teacher_of(
    &self,
    actor: &Identity,
    classroom_id: Uuid,
  ) -> Result<()> {
    if actor.role != Role::Teacher {
      return Err(Error::forbidden("only teachers can give feedback"));
    }
    let role = self.directory.role(actor.user_id).await?;
    if role != Some(Role::Teacher)
      || !self.directory.is_teacher(classroom_id, actor.user_id).await?
    {
      debug!(user = %actor.user_id, classroom = %classroom_id, "teacher check failed");
      return Err(Error::forbidden("not a teacher of the entry's classroom"));
    }
    Ok(())
  }

  /// Publishing: the author must belong to the target classroom.
  pub async fn require_membership(&self, author_id: Uuid, classroom_id: Uuid) -> Result<()> {
    if self.directory.is_member(classroom_id, author_id).await? {
      Ok(())
    } else {
      Err(Error::InvalidClassroom(classroom_id))
    }
  }

  async fn classroom_access(
    &self,
    actor: &Identity,
    classroom_id: Uuid,
  ) -> Result<Option<Access>> {
    if self.directory.is_teacher(classroom_id, actor.user_id).await? {
      return Ok(Some(Access::Teacher));
    }
    if self.directory.is_member(classroom_id, actor.user_id).await? {
      return Ok(Some(Access::Member));
    }
    Ok(None)
  }
}
