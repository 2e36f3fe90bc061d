use state_machines::state_machine;

state_machine! {
    name: TransformMachine,
    state: TransformState,
    initial: Ready,
    states: [Ready, Extracted, Cleaned, Scrubbed, Generated, Exported],
    events {
        extract { transition: { from: Ready, to: Extracted } }
        clean { transition: { from: Extracted, to: Cleaned } }
        scrub { transition: { from: Cleaned, to: Scrubbed } }
        generate { transition: { from: Scrubbed, to: Generated } }
        export { transition: { from: Generated, to: Exported } }
    }
}

pub fn ready() -> TransformMachine<(), Ready> {
    TransformMachine::new(())
}
