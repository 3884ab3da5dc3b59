use solid_synthesis as ss;

fn main() -> Result<(), ss::Error> {
    let exemplar = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "imgs/wood.png".to_owned());

    // Create a new session
    let session = ss::Session::builder()
        // The image every slice of the volume should look like
        .exemplar(&exemplar)
        .volume_size(32)
        .iterations(3)
        .seed(7)
        .build()?;

    // Print the energy as every pass finishes
    let progress = |update: ss::ProgressUpdate<'_>| {
        if let Some(energy) = update.energy {
            println!("pass {} energy {}", update.pass_index + 1, energy);
        }
    };

    let generated = session.run(Some(Box::new(progress)))?;

    // Save the volume to disk
    generated.save("out/01.vol")
}
