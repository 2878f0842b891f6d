use async_trait::async_trait;

use crate::database::Database;
use crate::error::StoreError;
use crate::models::{Admin, OccupantRecord, SubscriptionPlan};

use super::{NewPlan, NewRecord, PlanPatch, RecordPatch, RecordStore};

/// Production store backed by the Postgres pool. Uniqueness comes from the
/// schema (seat_number, plan_name, email, and a partial index on active
/// national ids), so a lost check-then-write race surfaces as
/// `StoreError::UniqueViolation`.
#[derive(Clone)]
pub struct PgRecordStore {
    db: Database,
}

impl PgRecordStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn find_by_seat(&self, seat: &str) -> Result<Option<OccupantRecord>, StoreError> {
        let rec = sqlx::query_as::<_, OccupantRecord>(
            "SELECT * FROM occupants WHERE seat_number = $1",
        )
        .bind(seat)
        .fetch_optional(&self.db.pool)
        .await?;
        Ok(rec)
    }

    async fn find_seat_family(&self, base: &str) -> Result<Vec<OccupantRecord>, StoreError> {
        // base ids only contain [A-Z0-9], safe to splice into the pattern
        let pattern = format!("^{base}($|_)");
        let recs = sqlx::query_as::<_, OccupantRecord>(
            "SELECT * FROM occupants WHERE seat_number ~ $1 ORDER BY id",
        )
        .bind(pattern)
        .fetch_all(&self.db.pool)
        .await?;
        Ok(recs)
    }

    async fn find_active_by_national_id(
        &self,
        national_id: &str,
    ) -> Result<Option<OccupantRecord>, StoreError> {
        let rec = sqlx::query_as::<_, OccupantRecord>(
            "SELECT * FROM occupants WHERE national_id = $1 AND is_active = TRUE",
        )
        .bind(national_id)
        .fetch_optional(&self.db.pool)
        .await?;
        Ok(rec)
    }

    async fn count_section_records(&self, section: char) -> Result<u64, StoreError> {
        let pattern = format!("^{section}[0-9]");
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM occupants WHERE seat_number ~ $1",
        )
        .bind(pattern)
        .fetch_one(&self.db.pool)
        .await?;
        Ok(count as u64)
    }

    async fn list_occupants(&self) -> Result<Vec<OccupantRecord>, StoreError> {
        let recs = sqlx::query_as::<_, OccupantRecord>(
            "SELECT * FROM occupants ORDER BY seat_number",
        )
        .fetch_all(&self.db.pool)
        .await?;
        Ok(recs)
    }

    async fn insert_occupant(&self, rec: NewRecord) -> Result<OccupantRecord, StoreError> {
        let inserted = sqlx::query_as::<_, OccupantRecord>(
            r#"
            INSERT INTO occupants
                (seat_number, name, national_id, secondary_id, father_name,
                 address, age, slot, plan_id, join_date, is_active, fee_paid)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(&rec.seat_number)
        .bind(&rec.name)
        .bind(&rec.national_id)
        .bind(&rec.secondary_id)
        .bind(&rec.father_name)
        .bind(&rec.address)
        .bind(rec.age)
        .bind(&rec.slot)
        .bind(rec.plan_id)
        .bind(rec.join_date)
        .bind(rec.is_active)
        .bind(rec.fee_paid)
        .fetch_one(&self.db.pool)
        .await?;
        Ok(inserted)
    }

    async fn insert_occupants(&self, recs: Vec<NewRecord>) -> Result<u64, StoreError> {
        let mut tx = self.db.pool.begin().await.map_err(StoreError::from)?;
        let mut inserted = 0u64;
        for rec in recs {
            sqlx::query(
                r#"
                INSERT INTO occupants
                    (seat_number, name, national_id, secondary_id, father_name,
                     address, age, slot, plan_id, join_date, is_active, fee_paid)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                "#,
            )
            .bind(&rec.seat_number)
            .bind(&rec.name)
            .bind(&rec.national_id)
            .bind(&rec.secondary_id)
            .bind(&rec.father_name)
            .bind(&rec.address)
            .bind(rec.age)
            .bind(&rec.slot)
            .bind(rec.plan_id)
            .bind(rec.join_date)
            .bind(rec.is_active)
            .bind(rec.fee_paid)
            .execute(&mut *tx)
            .await?;
            inserted += 1;
        }
        tx.commit().await.map_err(StoreError::from)?;
        Ok(inserted)
    }

    async fn update_by_seat(
        &self,
        seat: &str,
        patch: RecordPatch,
    ) -> Result<Option<OccupantRecord>, StoreError> {
        // NULL binds leave the column unchanged; patches never clear fields
        let rec = sqlx::query_as::<_, OccupantRecord>(
            r#"
            UPDATE occupants SET
                name = COALESCE($2, name),
                national_id = COALESCE($3, national_id),
                secondary_id = COALESCE($4, secondary_id),
                father_name = COALESCE($5, father_name),
                address = COALESCE($6, address),
                age = COALESCE($7, age),
                slot = COALESCE($8, slot),
                plan_id = COALESCE($9, plan_id),
                join_date = COALESCE($10, join_date),
                is_active = COALESCE($11, is_active),
                fee_paid = COALESCE($12, fee_paid)
            WHERE seat_number = $1
            RETURNING *
            "#,
        )
        .bind(seat)
        .bind(&patch.name)
        .bind(&patch.national_id)
        .bind(&patch.secondary_id)
        .bind(&patch.father_name)
        .bind(&patch.address)
        .bind(patch.age)
        .bind(&patch.slot)
        .bind(patch.plan_id)
        .bind(patch.join_date)
        .bind(patch.is_active)
        .bind(patch.fee_paid)
        .fetch_optional(&self.db.pool)
        .await?;
        Ok(rec)
    }

    async fn delete_by_seat(&self, seat: &str) -> Result<u64, StoreError> {
        let res = sqlx::query("DELETE FROM occupants WHERE seat_number = $1")
            .bind(seat)
            .execute(&self.db.pool)
            .await?;
        Ok(res.rows_affected())
    }

    /* ---------- PLANS ---------- */

    async fn find_plan_by_id(&self, id: i64) -> Result<Option<SubscriptionPlan>, StoreError> {
        let plan = sqlx::query_as::<_, SubscriptionPlan>("SELECT * FROM plans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db.pool)
            .await?;
        Ok(plan)
    }

    async fn find_plan_by_name(
        &self,
        name: &str,
    ) -> Result<Option<SubscriptionPlan>, StoreError> {
        let plan =
            sqlx::query_as::<_, SubscriptionPlan>("SELECT * FROM plans WHERE plan_name = $1")
                .bind(name)
                .fetch_optional(&self.db.pool)
                .await?;
        Ok(plan)
    }

    async fn list_plans(&self) -> Result<Vec<SubscriptionPlan>, StoreError> {
        let plans =
            sqlx::query_as::<_, SubscriptionPlan>("SELECT * FROM plans ORDER BY plan_name")
                .fetch_all(&self.db.pool)
                .await?;
        Ok(plans)
    }

    async fn insert_plan(&self, plan: NewPlan) -> Result<SubscriptionPlan, StoreError> {
        let inserted = sqlx::query_as::<_, SubscriptionPlan>(
            r#"
            INSERT INTO plans (plan_name, price, duration, subscribers, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&plan.plan_name)
        .bind(plan.price)
        .bind(&plan.duration)
        .bind(plan.subscribers)
        .bind(plan.is_active)
        .fetch_one(&self.db.pool)
        .await?;
        Ok(inserted)
    }

    async fn update_plan_by_name(
        &self,
        name: &str,
        patch: PlanPatch,
    ) -> Result<Option<SubscriptionPlan>, StoreError> {
        let plan = sqlx::query_as::<_, SubscriptionPlan>(
            r#"
            UPDATE plans SET
                price = COALESCE($2, price),
                duration = COALESCE($3, duration),
                subscribers = COALESCE($4, subscribers),
                is_active = COALESCE($5, is_active)
            WHERE plan_name = $1
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(patch.price)
        .bind(&patch.duration)
        .bind(patch.subscribers)
        .bind(patch.is_active)
        .fetch_optional(&self.db.pool)
        .await?;
        Ok(plan)
    }

    async fn delete_plan(&self, id: i64) -> Result<u64, StoreError> {
        let res = sqlx::query("DELETE FROM plans WHERE id = $1")
            .bind(id)
            .execute(&self.db.pool)
            .await?;
        Ok(res.rows_affected())
    }

    async fn adjust_plan_subscribers(&self, id: i64, delta: i32) -> Result<(), StoreError> {
        sqlx::query("UPDATE plans SET subscribers = GREATEST(subscribers + $2, 0) WHERE id = $1")
            .bind(id)
            .bind(delta)
            .execute(&self.db.pool)
            .await?;
        Ok(())
    }

    /* ---------- ADMINS ---------- */

    async fn find_admin_by_id(&self, id: i64) -> Result<Option<Admin>, StoreError> {
        let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db.pool)
            .await?;
        Ok(admin)
    }

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>, StoreError> {
        let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.db.pool)
            .await?;
        Ok(admin)
    }

    async fn count_admins(&self) -> Result<u64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admins")
            .fetch_one(&self.db.pool)
            .await?;
        Ok(count as u64)
    }

    async fn insert_admin(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Admin, StoreError> {
        let admin = sqlx::query_as::<_, Admin>(
            "INSERT INTO admins (username, email, password_hash) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.db.pool)
        .await?;
        Ok(admin)
    }
}
