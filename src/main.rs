#[actix_web::main]
async fn main() -> std::io::Result<()> {
    threatlens_lib::run().await
}
