fn main() {
    plugctl::app::startup::startup();
}
