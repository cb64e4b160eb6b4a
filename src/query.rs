//! One update query, start to finish.
//!
//! normalize → look up endpoint → resolve device id → seal → send → open.
//! Every step runs in order on the caller's thread and the first failure
//! ends the query.  Retrying means calling again, which draws new keys.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::device::DeviceIdStore;
use crate::envelope::{
    EnvelopeBuilder, NormalizedArgs, QueryArgs, RequestPayload, ResponseResult, SealedRequest,
};
use crate::errors::Result;
use crate::region::{Region, RegionDirectory};
use crate::transport::Transport;

/// Read-only dependencies shared by every query.
#[derive(Debug, Clone, Copy)]
pub struct QueryContext<'a> {
    pub directory: &'a RegionDirectory,
    pub device_ids: &'a DeviceIdStore,
    pub home_region: Region,
}

impl<'a> QueryContext<'a> {
    pub fn new(directory: &'a RegionDirectory, device_ids: &'a DeviceIdStore) -> Self {
        Self {
            directory,
            device_ids,
            home_region: Region::HOME,
        }
    }

    pub fn with_home_region(mut self, region: Region) -> Self {
        self.home_region = region;
        self
    }
}

/// A sealed request together with the arguments it was built from.
#[derive(Debug)]
pub struct PreparedQuery {
    pub args: NormalizedArgs,
    pub sealed: SealedRequest,
}

/// Build (but do not send) the request for `args`.
pub fn prepare(args: &QueryArgs, ctx: &QueryContext<'_>) -> Result<PreparedQuery> {
    let args = args.normalize(ctx.home_region)?;
    let endpoint = ctx.directory.endpoint(args.region)?;
    let device_id = ctx.device_ids.resolve(args.imei.as_deref())?;
    debug!(
        region = %args.region,
        model = %args.model,
        ota_version = %args.ota_version,
        "query arguments normalized"
    );

    let payload = RequestPayload::new(device_id.clone(), Utc::now().timestamp_millis());
    let sealed = EnvelopeBuilder::new(&endpoint)
        .headers(args.headers(&endpoint, &device_id))
        .seal(&payload.to_bytes()?)?;

    Ok(PreparedQuery { args, sealed })
}

/// Run a full update query and return the reply with its body decrypted.
pub fn query_update<T: Transport + ?Sized>(
    args: &QueryArgs,
    ctx: &QueryContext<'_>,
    transport: &T,
) -> Result<ResponseResult> {
    let prepared = prepare(args, ctx)?;
    let (envelope, key) = prepared.sealed.into_parts();

    let raw = transport.post(&envelope)?;

    let mut result = ResponseResult::from_slice(&raw)?;
    result.decrypt_body(&key)?;

    if result.is_success() {
        info!(region = %prepared.args.region, "update query succeeded");
    } else {
        warn!(
            code = result.response_code,
            err = result.err_msg.as_deref().unwrap_or(""),
            "server returned a non-success code"
        );
    }
    Ok(result)
}
