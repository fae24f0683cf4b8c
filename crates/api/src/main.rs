use iam_api::ApiServer;
use iam_result::errors::BoxedErr;

#[tokio::main]
async fn main() -> Result<(), BoxedErr> {
  let server = ApiServer::new().await;
  match server {
    Ok(srv) => srv.run().await,
    Err(e) => Err(e),
  }
}
