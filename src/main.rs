use campaign_console::error::Error;

#[actix_web::main]
async fn main() -> Result<(), Error> {
    campaign_console::run().await
}
