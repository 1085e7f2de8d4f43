//! Full viewer round trip against the in-process calculator

use tower_viewer::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let calculator = LocalCalculator::new(ProfileLibrary::new(
        vec![ProfileDescriptor::named("RD 2in")],
        vec![ProfileDescriptor::named("L2x2x3/16"), ProfileDescriptor::named("L3x3x1/4")],
    ));

    let input = TowerInput::new("tower_30", 3.6, 2.0, 30.0, 8, 2).with_wind(ExposureCategory::C, 1.0, 30.0, 42.0);
    let mut session = Session::new(input);
    session.refresh_library(&calculator).await;
    session.submit(&calculator).await?;

    // Heavier legs at the base, then recalculate
    for index in 1..=4 {
        session.dispatch(ViewerEvent::ProfileChosen {
            section: 1,
            group: ElementGroup::new(GroupClass::Leg, index),
            name: "RD 2in".to_string(),
        });
    }
    session.submit(&calculator).await?;

    session.dispatch(ViewerEvent::ElementClicked(ElementKey::new(1, 0)));

    let geometry = session.require_geometry()?;
    println!("Tower: {}", session.input().tower_id);
    println!("  Sections: {}", geometry.sections().len());
    println!("  Nodes:    {}", geometry.node_count());
    println!("  Elements: {}", geometry.element_count());
    println!("  Assigned: {}", session.assignments().assigned_count());

    if let Some(scene) = session.scene().description() {
        println!("Scene:");
        println!("  Members: {}", scene.members.len());
        println!("  Markers: {}", scene.nodes.len());
        for label in &scene.labels {
            println!("  Label:   {}", label.text);
        }
    }

    println!("{}", session.snapshot().to_pretty_json()?);
    Ok(())
}
