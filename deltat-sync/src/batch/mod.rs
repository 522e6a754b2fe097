//! Batch driver
//!
//! For each owner identity: open a session, find the target dataset, process
//! every image, close the session. Strictly sequential. A failure aborts only
//! the unit of work it happened in (owner or image) and is logged with enough
//! context to follow up by hand.

pub mod statistics;

pub use statistics::{FailureRecord, ImageOutcome, ImageReport, OwnerReport, RunSummary};

use crate::error::{LookupTarget, RemoteError, SyncError};
use crate::model::Credentials;
use crate::reconcile::{
    locate_plane_infos, persist_plane_infos, ImageContext, PlaneInfoState, Reconciler,
    Reconciliation,
};
use crate::remote::{Connector, RemoteSession};
use deltat_common::Interval;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Per-run settings shared by every owner and image
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub dataset_name: String,
    pub interval: Interval,
    /// Read and reconcile, but never save
    pub dry_run: bool,
}

/// Drives a synchronisation run over a list of owner identities
pub struct BatchSynchronizer<C: Connector> {
    connector: C,
    password: String,
    options: BatchOptions,
    reconciler: Reconciler,
}

impl<C: Connector> BatchSynchronizer<C> {
    pub fn new(connector: C, password: impl Into<String>, options: BatchOptions) -> Self {
        let reconciler = Reconciler::new(options.interval);
        Self {
            connector,
            password: password.into(),
            options,
            reconciler,
        }
    }

    /// Process every owner in order and summarise
    pub async fn run(&self, owners: &[String]) -> RunSummary {
        let run_id = Uuid::new_v4();
        let mut summary = RunSummary::new(run_id, self.options.dry_run);

        let span = info_span!("run", run_id = %run_id);
        async {
            info!(
                owners = owners.len(),
                dataset = %self.options.dataset_name,
                interval_s = self.options.interval.seconds(),
                dry_run = self.options.dry_run,
                "Starting deltaT synchronisation"
            );

            for owner in owners {
                let report = self.sync_owner(owner).await;
                summary.record_owner(&report);
            }

            summary.finish();
            info!("Run complete: {}", summary.display_string());
        }
        .instrument(span)
        .await;

        summary
    }

    /// Process one owner identity
    ///
    /// The session is closed on every path once it has been opened.
    pub async fn sync_owner(&self, owner: &str) -> OwnerReport {
        let span = info_span!("owner", owner = %owner);
        async {
            let mut report = OwnerReport::new(owner);
            let credentials = Credentials::new(owner, self.password.as_str());

            let mut session = match self.connector.authenticate(&credentials).await {
                Ok(session) => session,
                Err(source) => {
                    let err = SyncError::AuthenticationFailure {
                        owner: owner.to_string(),
                        source,
                    };
                    error!("{}", err);
                    report.error = Some(err);
                    return report;
                }
            };

            if let Err(err) = self.sync_dataset(&mut session, &mut report).await {
                error!(kind = err.kind(), "{}", err);
                report.error = Some(err);
            }

            if let Err(e) = session.close().await {
                warn!("Failed to close session for {}: {}", owner, e);
            }

            info!(
                dataset_id = ?report.dataset_id,
                images = report.images.len(),
                failed = report.failed_images(),
                "Owner finished"
            );
            report
        }
        .instrument(span)
        .await
    }

    async fn sync_dataset(
        &self,
        session: &mut C::Session,
        report: &mut OwnerReport,
    ) -> Result<(), SyncError> {
        let owner = report.owner.clone();
        let dataset_name = &self.options.dataset_name;

        let lookup_failure = |target: LookupTarget, source: RemoteError| SyncError::LookupFailure {
            owner: owner.clone(),
            target,
            source,
        };

        let datasets = session
            .find_datasets(&owner, dataset_name)
            .await
            .map_err(|source| {
                lookup_failure(
                    LookupTarget::Dataset {
                        name: dataset_name.clone(),
                    },
                    source,
                )
            })?;

        let Some(dataset) = datasets.first() else {
            return Err(lookup_failure(
                LookupTarget::Dataset {
                    name: dataset_name.clone(),
                },
                RemoteError::NotFound(format!(
                    "no dataset '{}' owned by {}",
                    dataset_name, owner
                )),
            ));
        };

        if datasets.len() > 1 {
            let others: Vec<i64> = datasets[1..].iter().map(|d| d.id).collect();
            warn!(
                dataset_id = dataset.id,
                ignored = ?others,
                "Several datasets named '{}', using the first",
                dataset_name
            );
        }

        let dataset_id = dataset.id;
        report.dataset_id = Some(dataset_id);
        info!(dataset_id, "dataset {}", dataset_id);

        let image_ids = session
            .list_image_ids(dataset_id)
            .await
            .map_err(|source| lookup_failure(LookupTarget::ImageList { dataset_id }, source))?;

        info!(dataset_id, images = image_ids.len(), "Listed dataset images");

        for image_id in image_ids {
            let ctx = ImageContext::new(owner.as_str(), dataset_id, image_id);
            let result = self
                .sync_image(session, &ctx)
                .instrument(info_span!("image", image_id))
                .await;

            if let Err(err) = &result {
                error!(
                    kind = err.kind(),
                    dataset_id,
                    image_id,
                    "Image skipped: {}",
                    err
                );
            }

            report.images.push(ImageReport { image_id, result });
        }

        Ok(())
    }

    /// locate → reconcile → persist for one image
    async fn sync_image(
        &self,
        session: &mut C::Session,
        ctx: &ImageContext,
    ) -> Result<ImageOutcome, SyncError> {
        let image = session
            .get_image(ctx.image_id)
            .await
            .map_err(|source| SyncError::LookupFailure {
                owner: ctx.owner.clone(),
                target: LookupTarget::Image {
                    dataset_id: ctx.dataset_id,
                    image_id: ctx.image_id,
                },
                source,
            })?;

        let located = locate_plane_infos(session, ctx, &image).await?;
        info!(
            pixels_id = image.pixels_id,
            size_t = image.size_t,
            "Found {} existing PlaneInfo records",
            located.len()
        );

        let reconciliation = self
            .reconciler
            .reconcile(&image, PlaneInfoState::from(located));
        let records = reconciliation.len();

        let written = if self.options.dry_run {
            info!(records, "Dry run, not saving");
            0
        } else {
            persist_plane_infos(session, ctx, reconciliation.records()).await?
        };

        Ok(match reconciliation {
            Reconciliation::Create(_) => ImageOutcome::Created { records, written },
            Reconciliation::Update(_) => ImageOutcome::Updated { records, written },
        })
    }
}
