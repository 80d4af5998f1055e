use clap::Args;
use shopfront_app::{
    database::{self, Db},
    domain::products::{
        PgProductCatalog, ProductCatalog,
        data::NewProduct,
        records::ProductUuid,
    },
};
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct CreateProductArgs {
    /// Product display name
    #[arg(long)]
    name: String,

    /// Price in minor units
    #[arg(long)]
    price: u64,

    #[arg(long, default_value = "")]
    description: String,

    #[arg(long)]
    image_path: Option<String>,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Optional product UUID; generated when omitted
    #[arg(long)]
    product_uuid: Option<Uuid>,
}

pub(crate) async fn run(args: CreateProductArgs) -> Result<(), String> {
    if args.name.trim().is_empty() {
        return Err("name cannot be empty".to_string());
    }

    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let catalog = PgProductCatalog::new(Db::new(pool));

    let product = catalog
        .create_product(NewProduct {
            uuid: args
                .product_uuid
                .map_or_else(ProductUuid::new, ProductUuid::from_uuid),
            name: args.name,
            price: args.price,
            description: args.description,
            image_path: args.image_path,
        })
        .await
        .map_err(|error| format!("failed to create product: {error}"))?;

    println!("product_uuid: {}", product.uuid);
    println!("product_name: {}", product.name);
    println!("product_price: {}", product.price);

    Ok(())
}
