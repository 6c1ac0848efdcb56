use crate::registry::{StepRegistry, StepSpec};

/// The Dobot Magician pick-and-place walkthrough the viewer ships with.
pub fn dobot_tutorial() -> StepRegistry {
    let specs = vec![
        StepSpec::model(
            "models/model1.glb",
            "Step 1: Click the power button and wait for green light.",
        )
        .with_title("Power ON")
        .with_highlight("power_button"),
        StepSpec::image("models/model2.png", "Step 2: Select COM port and click connect.")
            .with_title("Connect Software"),
        StepSpec::image("models/model3.png", "Step 3: Select teaching and playback mode.")
            .with_title("Teaching Mode"),
        StepSpec::image("models/model4.png", "Step 4: Create a new empty file.")
            .with_title("New File"),
        StepSpec::image("models/model5.png", "Step 5: Select suction cup tool.")
            .with_title("Select Tool"),
        StepSpec::model("models/model6.glb", "Step 6: Locate button on robot arm.")
            .with_title("Teach Button")
            .with_highlight("teach_button"),
        StepSpec::image("models/model7.png", "Step 7: Press button and move arm.")
            .with_title("Record Point"),
        StepSpec::image("models/model8.png", "Step 8: Enable SuctionCupOn.")
            .with_title("Enable Suction"),
        StepSpec::image("models/model9.png", "Step 9: Move arm to drop position.")
            .with_title("Move to Drop"),
        StepSpec::image("models/model10.png", "Step 10: Press start.")
            .with_title("Start Playback"),
        StepSpec::image("models/model11.png", "Step 11: Exit and disconnect.")
            .with_title("Shutdown"),
        StepSpec::model("models/model12.glb", "Step 12: Power off robot.")
            .with_title("Power OFF")
            .with_highlight("power_button"),
    ];
    match StepRegistry::new(specs) {
        Ok(registry) => registry,
        // The list above is non-empty and every asset path is set.
        Err(e) => unreachable!("built-in tutorial is invalid: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arstep_common::AssetKind;

    #[test]
    fn builtin_has_twelve_steps() {
        let reg = dobot_tutorial();
        assert_eq!(reg.len(), 12);
        assert_eq!(reg.get(0).unwrap().kind(), AssetKind::Model);
        assert_eq!(reg.get(1).unwrap().kind(), AssetKind::Image);
        assert_eq!(reg.get(11).unwrap().kind(), AssetKind::Model);
    }

    #[test]
    fn builtin_models_have_highlights() {
        let reg = dobot_tutorial();
        for step in reg.iter().filter(|s| s.kind() == AssetKind::Model) {
            assert!(step.content().highlight().is_some());
        }
    }
}
