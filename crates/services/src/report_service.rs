//! Report Service. The reporter only names a target; what kind of target it is
//! gets resolved here, users first.

use std::sync::Arc;

use domains::{
    AppError, Page, PageRequest, Report, ReportRepository, ReportStats, ReportedType, Result,
    ThreadRepository, UserRepository,
};
use tracing::info;
use uuid::Uuid;

pub struct ReportService {
    reports: Arc<dyn ReportRepository>,
    users: Arc<dyn UserRepository>,
    threads: Arc<dyn ThreadRepository>,
}

impl ReportService {
    pub fn new(
        reports: Arc<dyn ReportRepository>,
        users: Arc<dyn UserRepository>,
        threads: Arc<dyn ThreadRepository>,
    ) -> Self {
        Self { reports, users, threads }
    }

    pub async fn create(&self, reporter_id: Uuid, reported_id: Uuid) -> Result<Report> {
        let reported_type = self.resolve_target(reported_id).await?;
        let report = Report::new(reporter_id, reported_id, reported_type);

        if !self.reports.insert_unique(&report).await? {
            return Err(AppError::AlreadyReported { reporter_id, reported_id });
        }
        info!(%reporter_id, %reported_id, reported_type = %reported_type, "report filed");
        Ok(report)
    }

    async fn resolve_target(&self, reported_id: Uuid) -> Result<ReportedType> {
        if self.users.find_by_id(reported_id).await?.is_some() {
            return Ok(ReportedType::User);
        }
        if self.threads.find_by_id(reported_id).await?.is_some() {
            return Ok(ReportedType::Thread);
        }
        Err(AppError::TargetNotFound(reported_id))
    }

    pub async fn count_by_target(&self, reported_id: Uuid) -> Result<u64> {
        self.reports.count_by_target(reported_id).await
    }

    pub async fn count_all(&self) -> Result<u64> {
        self.reports.count_all().await
    }

    pub async fn count_by_type(&self, reported_type: ReportedType) -> Result<u64> {
        self.reports.count_by_type(reported_type).await
    }

    pub async fn stats(&self) -> Result<ReportStats> {
        let (total, users, threads) = futures::try_join!(
            self.count_all(),
            self.count_by_type(ReportedType::User),
            self.count_by_type(ReportedType::Thread),
        )?;
        Ok(ReportStats { total, users, threads })
    }

    pub async fn list(&self, reported_type: Option<ReportedType>, page: PageRequest) -> Result<Page<Report>> {
        let total = async {
            match reported_type {
                Some(kind) => self.count_by_type(kind).await,
                None => self.count_all().await,
            }
        };
        let (items, total) = futures::try_join!(
            self.reports.find_page(reported_type, page.skip(), page.limit),
            total,
        )?;
        Ok(Page::new(items, page, total))
    }

    /// Cascade primitive for thread and user deletion.
    pub async fn delete_all_by_target(&self, reported_id: Uuid) -> Result<u64> {
        self.reports.delete_by_target(reported_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{MockReportRepository, MockThreadRepository, MockUserRepository, Role, Thread, User};

    fn service(reports: MockReportRepository, users: MockUserRepository, threads: MockThreadRepository) -> ReportService {
        ReportService::new(Arc::new(reports), Arc::new(users), Arc::new(threads))
    }

    #[tokio::test]
    async fn users_are_probed_before_threads() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| Ok(Some(User::new("u", "u@example.com", Role::User))));
        let mut threads = MockThreadRepository::new();
        threads.expect_find_by_id().never();
        let mut reports = MockReportRepository::new();
        reports.expect_insert_unique().returning(|_| Ok(true));

        let report = service(reports, users, threads).create(Uuid::now_v7(), Uuid::now_v7()).await.unwrap();
        assert_eq!(report.reported_type, ReportedType::User);
        assert_eq!(report.report_detail, Report::DEFAULT_DETAIL);
    }

    #[tokio::test]
    async fn thread_target_resolves_second() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| Ok(None));
        let mut threads = MockThreadRepository::new();
        threads
            .expect_find_by_id()
            .returning(|_| Ok(Some(Thread::new(Uuid::now_v7(), Uuid::now_v7(), "t", "d"))));
        let mut reports = MockReportRepository::new();
        reports.expect_insert_unique().returning(|_| Ok(true));

        let report = service(reports, users, threads).create(Uuid::now_v7(), Uuid::now_v7()).await.unwrap();
        assert_eq!(report.reported_type, ReportedType::Thread);
    }

    #[tokio::test]
    async fn unresolvable_target_is_not_found() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| Ok(None));
        let mut threads = MockThreadRepository::new();
        threads.expect_find_by_id().returning(|_| Ok(None));
        let mut reports = MockReportRepository::new();
        reports.expect_insert_unique().never();

        let err = service(reports, users, threads).create(Uuid::now_v7(), Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, AppError::TargetNotFound(_)));
    }

    #[tokio::test]
    async fn stats_aggregate_by_type() {
        let mut reports = MockReportRepository::new();
        reports.expect_count_all().returning(|| Ok(5));
        reports.expect_count_by_type().returning(|kind| Ok(if kind == ReportedType::User { 2 } else { 3 }));

        let stats = service(reports, MockUserRepository::new(), MockThreadRepository::new())
            .stats()
            .await
            .unwrap();
        assert_eq!(stats, ReportStats { total: 5, users: 2, threads: 3 });
    }
}
