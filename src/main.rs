fn main() {
    sectorflow::run();
}
