fn main() {
    triage_lib::run()
}
