use futures_util::future::join_all;
use tracing::{debug, info, warn};

use tokend_slo::{errors, is_uuid_v4, Result};
use tokend_storage::{revocation::Revocation, Interface};

use super::TokenService;

impl<T, D> TokenService<T, D>
where
    D: Interface<T = Revocation>,
{
    /// Writes a denylist entry for every well-formed jti. Malformed ids are
    /// skipped and failed writes are logged; the batch itself never fails.
    pub async fn revoke<S: AsRef<str>>(&self, jtis: &[S]) -> Result<()> {
        info!("revoking {} token(s)", jtis.len());
        let record = &Revocation::now();
        let writes = jtis
            .iter()
            .map(AsRef::as_ref)
            .filter(|jti| {
                let valid = is_uuid_v4(jti);
                if !valid {
                    debug!("skipping malformed jti {:?}", jti);
                }
                valid
            })
            .map(|jti| async move {
                let result =
                    self.denylist.put(jti, record, self.denylist_ttl).await;
                (jti, result)
            });

        for (jti, result) in join_all(writes).await {
            if let Err(err) = result {
                warn!("failed to revoke {}: {}", jti, err);
            }
        }
        Ok(())
    }

    /// `Ok` when `jti` has no denylist entry.
    pub async fn check_revoked(&self, jti: &str) -> Result<()> {
        info!("checking revocation of {}", jti);
        if !is_uuid_v4(jti) {
            return Err(errors::invalid_values("jti must be a UUIDv4"));
        }
        match self.denylist.get(jti).await? {
            Some(record) => {
                debug!("{} revoked at {:?}", jti, record.date);
                Err(errors::denied())
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use mockall::{
        mock,
        predicate::{always, eq},
    };
    use tokend_storage::MemoryImpl;

    use super::*;
    use crate::{
        services::token::AccessToken,
        testing::{self, DURATION, ISSUER},
    };

    mock! {
        Store {}

        #[async_trait]
        impl Interface for Store {
            type T = Revocation;

            async fn put(
                &self,
                id: &str,
                input: &Revocation,
                ttl: u64,
            ) -> Result<()>;
            async fn get(&self, id: &str) -> Result<Option<Revocation>>;
        }
    }

    fn service<D>(denylist: D, ttl: u64) -> TokenService<AccessToken, D> {
        TokenService::new(
            testing::access_token(),
            denylist,
            ISSUER.to_owned(),
            DURATION,
            ttl,
        )
    }

    #[tokio::test]
    async fn revoked_jti_is_denied() {
        let svc = service(MemoryImpl::<Revocation>::new(), 0);
        let revoked = tokend_slo::next_jti();
        let other = tokend_slo::next_jti();

        svc.check_revoked(&revoked).await.unwrap();
        svc.revoke(&[revoked.as_str(), "not-a-uuid"]).await.unwrap();

        assert_eq!(
            svc.check_revoked(&revoked).await.unwrap_err(),
            errors::denied()
        );
        svc.check_revoked(&other).await.unwrap();
    }

    #[tokio::test]
    async fn malformed_jti_never_reaches_the_store() {
        let mut store = MockStore::new();
        store.expect_get().never();
        store.expect_put().never();
        let svc = service(store, 0);

        svc.revoke(&["", "1234", "6ba7b810-9dad-11d1-80b4-00c04fd430c8"])
            .await
            .unwrap();
        for jti in ["", "abc", "6ba7b810-9dad-11d1-80b4-00c04fd430c8"] {
            assert_eq!(
                svc.check_revoked(jti).await.unwrap_err(),
                errors::invalid_values(""),
                "{jti}"
            );
        }
    }

    #[tokio::test]
    async fn partial_write_failure_is_tolerated() {
        let ok = tokend_slo::next_jti();
        let broken = tokend_slo::next_jti();

        let mut store = MockStore::new();
        store
            .expect_put()
            .with(eq(ok.clone()), always(), eq(300))
            .times(1)
            .returning(|_, _, _| Ok(()));
        store
            .expect_put()
            .with(eq(broken.clone()), always(), eq(300))
            .times(1)
            .returning(|_, _, _| Err(errors::any(std::fmt::Error)));
        let svc = service(store, 300);

        svc.revoke(&[ok, broken]).await.unwrap();
    }

    #[tokio::test]
    async fn any_stored_record_is_denied() {
        let mut store = MockStore::new();
        store
            .expect_get()
            .times(1)
            .returning(|_| Ok(Some(Revocation { date: None })));
        let svc = service(store, 0);

        assert_eq!(
            svc.check_revoked(&tokend_slo::next_jti()).await.unwrap_err(),
            errors::denied()
        );
    }

    #[tokio::test]
    async fn store_failure_on_check_propagates() {
        let mut store = MockStore::new();
        store
            .expect_get()
            .times(1)
            .returning(|_| Err(errors::any(std::fmt::Error)));
        let svc = service(store, 0);

        let err = svc
            .check_revoked(&tokend_slo::next_jti())
            .await
            .unwrap_err();
        assert_eq!(err, errors::any(std::fmt::Error));
        assert_eq!(err.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
