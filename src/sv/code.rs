use crate::{
  entity::{CodeStatus, code, follow_pack, follow_session, pack, session, user},
  prelude::*,
  sv::{self, session::SessionView},
};

pub const DEFAULT_BATCH: usize = 10;
pub const MAX_BATCH: usize = 500;

/// Flips an active code to used. Only one redeemer can win the flip, so a
/// code read as active may still be lost here.
async fn spend<C: ConnectionTrait>(
  conn: &C,
  code_id: i32,
  user_id: i32,
) -> Result<()> {
  let spent = code::Entity::update_many()
    .set(code::ActiveModel {
      status: Set(CodeStatus::Used),
      user_id: Set(Some(user_id)),
      used_at: Set(Some(utils::now())),
      ..Default::default()
    })
    .filter(code::Column::Id.eq(code_id))
    .filter(code::Column::Status.eq(CodeStatus::Active))
    .exec(conn)
    .await?;
  if spent.rows_affected != 1 {
    return Err(Redeem::Used.into());
  }
  Ok(())
}

pub struct Code<'a> {
  db: &'a DatabaseConnection,
  length: usize,
}

impl<'a> Code<'a> {
  pub fn new(db: &'a DatabaseConnection, length: usize) -> Self {
    Self { db, length }
  }

  /// Inserts `count` fresh active codes for the pack. Values colliding with
  /// any stored code or with the batch itself are drawn again.
  pub async fn generate(
    &self,
    pack_id: i32,
    count: usize,
  ) -> Result<Vec<code::Model>> {
    if !(1..=MAX_BATCH).contains(&count) {
      return Err(Error::InvalidArgs(format!(
        "Code count must be between 1 and {MAX_BATCH}"
      )));
    }

    let txn = self.db.begin().await?;

    pack::Entity::find_by_id(pack_id)
      .one(&txn)
      .await?
      .ok_or(Error::PackNotFound)?;

    let mut batch = HashSet::with_capacity(count);
    while batch.len() < count {
      let mut fresh = Vec::new();
      while batch.len() + fresh.len() < count {
        let value = utils::random_code(self.length);
        if !batch.contains(&value) && !fresh.contains(&value) {
          fresh.push(value);
        }
      }

      let taken: HashSet<String> = code::Entity::find()
        .filter(code::Column::Code.is_in(fresh.clone()))
        .all(&txn)
        .await?
        .into_iter()
        .map(|c| c.code)
        .collect();
      if !taken.is_empty() {
        debug!("Re-rolling {} colliding codes", taken.len());
      }
      batch.extend(fresh.into_iter().filter(|v| !taken.contains(v)));
    }

    let now = utils::now();
    code::Entity::insert_many(batch.iter().map(|value| code::ActiveModel {
      pack_id: Set(pack_id),
      code: Set(value.clone()),
      status: Set(CodeStatus::Active),
      user_id: Set(None),
      created_at: Set(now),
      used_at: Set(None),
      ..Default::default()
    }))
    .exec(&txn)
    .await?;

    let codes = code::Entity::find()
      .filter(code::Column::Code.is_in(batch))
      .order_by_asc(code::Column::Id)
      .all(&txn)
      .await?;

    txn.commit().await?;
    info!("Generated {} codes for pack #{pack_id}", codes.len());
    Ok(codes)
  }

  pub async fn active_in_pack(&self, pack_id: i32) -> Result<Vec<code::Model>> {
    let codes = code::Entity::find()
      .filter(code::Column::PackId.eq(pack_id))
      .filter(code::Column::Status.eq(CodeStatus::Active))
      .order_by_asc(code::Column::Id)
      .all(self.db)
      .await?;
    Ok(codes)
  }

  pub async fn by_value(&self, value: &str) -> Result<code::Model> {
    code::Entity::find()
      .filter(code::Column::Code.eq(value))
      .one(self.db)
      .await?
      .ok_or(Error::CodeNotFound)
  }

  /// Manual override. Reactivating a code unbinds its user.
  pub async fn set_status(
    &self,
    id: i32,
    status: CodeStatus,
  ) -> Result<code::Model> {
    let code = code::Entity::find_by_id(id)
      .one(self.db)
      .await?
      .ok_or(Error::CodeNotFound)?;

    let mut active: code::ActiveModel = code.into();
    active.status = Set(status);
    if status == CodeStatus::Active {
      active.user_id = Set(None);
      active.used_at = Set(None);
    }
    Ok(active.update(self.db).await?)
  }

  pub async fn delete(&self, id: i32) -> Result<()> {
    let res = code::Entity::delete_by_id(id).exec(self.db).await?;
    if res.rows_affected == 0 {
      return Err(Error::CodeNotFound);
    }
    Ok(())
  }

  /// Spends an active code of `pack_id` and grants the user an approved
  /// follow of that pack.
  pub async fn redeem(
    &self,
    user_id: i32,
    pack_id: i32,
    value: &str,
  ) -> Result<follow_pack::Model> {
    let txn = self.db.begin().await?;

    user::Entity::find_by_id(user_id)
      .one(&txn)
      .await?
      .ok_or(Error::UserNotFound)?;
    let code = code::Entity::find()
      .filter(code::Column::Code.eq(value.trim()))
      .one(&txn)
      .await?
      .ok_or(Error::CodeNotFound)?;

    if code.pack_id != pack_id {
      return Err(Redeem::Mismatch.into());
    }
    match code.status {
      CodeStatus::Active => {}
      CodeStatus::Used => return Err(Redeem::Used.into()),
      CodeStatus::Pending => return Err(Redeem::Inactive.into()),
    }

    spend(&txn, code.id, user_id).await?;

    let follow = match follow_pack::Entity::find_by_id((user_id, pack_id))
      .one(&txn)
      .await?
    {
      Some(follow) if follow.approved => follow,
      Some(follow) => {
        follow_pack::ActiveModel { approved: Set(true), ..follow.into() }
          .update(&txn)
          .await?
      }
      None => {
        follow_pack::ActiveModel {
          user_id: Set(user_id),
          pack_id: Set(pack_id),
          approved: Set(true),
          created_at: Set(utils::now()),
        }
        .insert(&txn)
        .await?
      }
    };

    txn.commit().await?;
    info!("User #{user_id} redeemed code #{} for pack #{pack_id}", code.id);
    Ok(follow)
  }

  /// Sessions the redeeming user of a code is confirmed in.
  pub async fn sessions_of_user(&self, value: &str) -> Result<Vec<SessionView>> {
    let code = self.by_value(value).await?;
    let Some(user_id) = code.user_id else {
      return Ok(Vec::new());
    };

    let ids: Vec<i32> = follow_session::Entity::find()
      .filter(follow_session::Column::UserId.eq(user_id))
      .filter(follow_session::Column::Approved.eq(true))
      .all(self.db)
      .await?
      .into_iter()
      .map(|f| f.session_id)
      .collect();
    let sessions = session::Entity::find()
      .filter(session::Column::Id.is_in(ids))
      .order_by_asc(session::Column::StartDate)
      .all(self.db)
      .await?;

    sv::Session::new(self.db).views(sessions).await
  }
}
