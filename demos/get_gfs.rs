// demos/get_gfs.rs
use esr_weather::{EsrWeatherError, GridField, LatLon, WeatherRetriever};

#[tokio::main]
async fn main() -> Result<(), EsrWeatherError> {
    // Set RUST_LOG=info to see download and cache messages
    env_logger::init();

    let wellington = LatLon(-41.29, 174.78);
    let christchurch = LatLon(-43.53, 172.64);

    let retriever = WeatherRetriever::new();
    let data = retriever
        .retrieve()
        .start("20231001T00")
        .end("20231001T06")
        .locations(vec![wellington, christchurch])
        .call()
        .await?;

    let Some(grid) = data.as_grid() else {
        return Ok(());
    };
    for point in &grid.points {
        println!("Nearest GFS values for {:?}:", point.location);
        for (valid_time, fields) in &point.values {
            let temperature = fields.get(&GridField::Temperature);
            let rain = fields.get(&GridField::PrecipitationRate);
            println!("  {valid_time}: temperature {temperature:?} K, rain {rain:?} kg/m2/s");
        }
    }

    match serde_json::to_string_pretty(grid) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Could not serialize result: {e}"),
    }
    Ok(())
}
