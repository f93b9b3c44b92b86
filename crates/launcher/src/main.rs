fn main() {
    launcher::native::run();
}
