use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use futures::stream::BoxStream;
use tracing::{info, instrument};

use crate::error::{AppError, AppResult};
use crate::model::leave_request::{LeaveDecision, LeaveRequest, LeaveType, NewLeave};
use crate::store::{LeaveFilter, Store, Window};

const ENTITY: &str = "leave request";

/// Pending → Approved | Denied, decided exactly once.
pub struct LeaveWorkflow {
    store: Arc<dyn Store>,
}

impl LeaveWorkflow {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    #[instrument(name = "leave_submit", skip(self))]
    pub async fn submit(
        &self,
        employee_id: u64,
        start_date: NaiveDate,
        end_date: NaiveDate,
        leave_type: LeaveType,
    ) -> AppResult<LeaveRequest> {
        if end_date < start_date {
            return Err(AppError::InvalidRange {
                start: start_date,
                end: end_date,
            });
        }

        let leave = self
            .store
            .insert_leave(NewLeave {
                employee_id,
                start_date,
                end_date,
                leave_type,
            })
            .await?;

        info!(leave_id = leave.id, "Leave request submitted");
        Ok(leave)
    }

    pub async fn approve(&self, id: u64, approver_id: u64, at: NaiveDateTime) -> AppResult<LeaveRequest> {
        self.decide(id, LeaveDecision::Approve, approver_id, at).await
    }

    pub async fn deny(&self, id: u64, approver_id: u64, at: NaiveDateTime) -> AppResult<LeaveRequest> {
        self.decide(id, LeaveDecision::Deny, approver_id, at).await
    }

    #[instrument(name = "leave_decide", skip(self))]
    async fn decide(
        &self,
        id: u64,
        decision: LeaveDecision,
        approver_id: u64,
        at: NaiveDateTime,
    ) -> AppResult<LeaveRequest> {
        let leave = self.get(id).await?;
        if leave.status.is_terminal() {
            info!(status = %leave.status, "Decision rejected: already decided");
            return Err(AppError::AlreadyDecided { id });
        }

        let outcome = decision.outcome();
        if !self.store.decide_leave(id, outcome, approver_id, at).await? {
            // lost the compare-and-set to a concurrent decision or removal
            return match self.store.find_leave(id).await? {
                Some(current) if current.status.is_terminal() => Err(AppError::AlreadyDecided { id }),
                Some(_) => Err(AppError::Corrupt(format!(
                    "leave request {id} stayed pending after a rejected decision"
                ))),
                None => Err(AppError::NotFound { entity: ENTITY, id }),
            };
        }

        info!(status = %outcome, "Leave request decided");
        Ok(LeaveRequest {
            status: outcome,
            approver_id: Some(approver_id),
            decided_at: Some(at),
            ..leave
        })
    }

    pub async fn get(&self, id: u64) -> AppResult<LeaveRequest> {
        self.store
            .find_leave(id)
            .await?
            .ok_or(AppError::NotFound { entity: ENTITY, id })
    }

    pub fn list(&self, filter: LeaveFilter, window: Window) -> BoxStream<'_, AppResult<LeaveRequest>> {
        self.store.stream_leave(filter, window)
    }

    #[instrument(name = "leave_remove", skip(self))]
    pub async fn remove(&self, id: u64) -> AppResult<()> {
        if !self.store.soft_delete_leave(id).await? {
            return Err(AppError::NotFound { entity: ENTITY, id });
        }
        info!("Leave request soft-deleted");
        Ok(())
    }
}
