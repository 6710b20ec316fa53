// demos/get_obs.rs
use esr_weather::{DataType, EsrWeatherError, LatLon, WeatherRetriever};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<(), EsrWeatherError> {
    env_logger::init();

    // The BUFR decoder is an external tool; point this at your build of it
    let decoder = std::env::var("BUFRSURFACE_EXE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("rda-bufr-decode-ADPsfc/exe/bufrsurface.x"));

    let retriever = WeatherRetriever::with_archive_dir("weather_data_archive");
    let data = retriever
        .retrieve()
        .start("20231001T00")
        .end("20231001T00")
        .locations(vec![LatLon(-41.29, 174.78), LatLon(-36.85, 174.76)])
        .data_type(DataType::Obs)
        .decoder_exe(decoder)
        .buffer_degrees(2.0)
        .call()
        .await?;

    if let Some(observations) = data.as_observations() {
        println!("Nearest stations:\n{}", observations.frame);
    }
    Ok(())
}
